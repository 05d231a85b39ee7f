//! The symbol & rule store: an explicit `GrammarBuilder` authoring value and
//! the immutable, sealed `Grammar` it compiles into (spec §4.1).
//!
//! Modeled on the teacher's `Cfg` (`src/grammar.rs`) and its fluent
//! `ContextFree::rule()` entry point (`src/rule_builder.rs`), but as a single
//! concrete value type rather than a family of generic traits: this crate
//! has one grammar shape to support, not an open set of representations.

use std::collections::{HashMap, HashSet};

use crate::error::AuthoringError;
use crate::rule::{
    GrammaticalCase, PersonNumber, Rhs, Rule, RuleId, Tense, Text, VerbForm, EMPTY_TERMINAL,
};
use crate::semantic::SemanticId;
use crate::symbol::{Symbol, SymbolTable};

/// Authoring-time specification for a terminal rule.
#[derive(Default)]
pub struct TerminalRuleSpec {
    /// The literal surface string this rule matches on the RHS. Ignored when
    /// `empty` is set. Defaults to `text`'s literal form when left empty and
    /// `text` is itself a [`Text::Literal`].
    pub surface: Option<String>,
    /// The rule's display text (may differ from `surface`, e.g. when a
    /// substitution set normalizes several surface forms to one canonical
    /// inflection map).
    pub text: Option<Text>,
    /// Marks the rule insertable, at this cost.
    pub insertion_cost: Option<f64>,
    /// Authors the distinguished empty-terminal rule instead of a surface
    /// match.
    pub empty: bool,
    /// Tense tag, set by the terminal-set builder for `past`-family forms.
    pub tense: Option<Tense>,
}

/// Authoring-time specification for a nonterminal rule.
#[derive(Default)]
pub struct NonterminalRuleSpec {
    /// The rule's right-hand side symbols (length 1 or 2).
    pub rhs: Vec<Symbol>,
    /// The rule's semantic function.
    pub semantic: Option<SemanticId>,
    /// Marks a binary rule transposable, at this cost.
    pub transposition_cost: Option<f64>,
    /// Grammatical case tag.
    pub grammatical_case: Option<GrammaticalCase>,
    /// Verb form tag.
    pub verb_form: Option<VerbForm>,
    /// Person/number tag.
    pub person_number: Option<PersonNumber>,
}

/// The authoring-time grammar store. Not `Clone`: authoring is meant to run
/// once per grammar, then seal into a [`Grammar`] via [`GrammarBuilder::compile`].
pub struct GrammarBuilder {
    symbols: SymbolTable,
    rules: HashMap<Symbol, Vec<Rule>>,
    start_symbol: Option<Symbol>,
    deletables: HashSet<String>,
}

impl GrammarBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        GrammarBuilder {
            symbols: SymbolTable::new(),
            rules: HashMap::new(),
            start_symbol: None,
            deletables: HashSet::new(),
        }
    }

    /// Registers a fresh symbol. See [`SymbolTable::new_symbol`].
    pub fn new_symbol(&mut self, name_parts: &[&str]) -> Result<Symbol, AuthoringError> {
        let symbol = self.symbols.new_symbol(name_parts)?;
        self.rules.insert(symbol, Vec::new());
        Ok(symbol)
    }

    /// Designates `symbol` as the grammar's start symbol.
    pub fn set_start_symbol(&mut self, symbol: Symbol) {
        self.start_symbol = Some(symbol);
    }

    /// Declares `word` an elidable stop word, eligible for the insertion
    /// edit-rule generator (spec §4.4.3).
    pub fn add_deletable(&mut self, word: impl Into<String>) {
        self.deletables.insert(word.into());
    }

    /// Whether `word` was declared a deletable stop word, for the edit-rule
    /// generator (which runs before `compile()` seals the deletables set).
    pub fn is_deletable_during_authoring(&self, word: &str) -> bool {
        self.deletables.contains(word)
    }

    /// The symbol table, for read access by the terminal-set builder and
    /// edit-rule generator.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn next_cost(&self, lhs: Symbol, semantic: Option<&SemanticId>) -> f64 {
        let base = self.rules[&lhs].len() as f64 * 1e-7;
        base + semantic.map(|s| s.get().total_cost()).unwrap_or(0.0)
    }

    fn lhs_name(&self, lhs: Symbol) -> String {
        self.symbols.name(lhs).to_string()
    }

    /// Adds a terminal rule to `lhs`. Fails with `IllFormedRule` if neither
    /// `spec.empty`, `spec.surface`, nor a literal `spec.text` identify a
    /// surface form, and `DuplicateRule` if the same RHS already exists on
    /// `lhs`.
    pub fn add_terminal_rule(
        &mut self,
        lhs: Symbol,
        spec: TerminalRuleSpec,
    ) -> Result<RuleId, AuthoringError> {
        if !self.symbols.contains(lhs) {
            return Err(AuthoringError::UnknownSymbol {
                lhs_name: String::new(),
                symbol: lhs,
            });
        }
        let rhs_text = if spec.empty {
            EMPTY_TERMINAL.to_string()
        } else {
            match spec
                .surface
                .clone()
                .or_else(|| spec.text.as_ref().and_then(Text::as_literal).map(str::to_string))
            {
                Some(text) if !text.is_empty() => text,
                _ => {
                    return Err(AuthoringError::IllFormedRule {
                        lhs_name: self.lhs_name(lhs),
                        reason: "terminal rule has neither `empty`, `surface`, nor a literal `text`".to_string(),
                    })
                }
            }
        };
        let rhs = Rhs::Terminal(rhs_text.clone());
        let existing = &self.rules[&lhs];
        if existing.iter().any(|r| r.rhs == rhs) {
            return Err(AuthoringError::DuplicateRule {
                lhs_name: self.lhs_name(lhs),
            });
        }
        let cost = self.next_cost(lhs, None);
        let index = existing.len();
        let text = if spec.empty { None } else { spec.text };
        let rule = Rule {
            lhs,
            rhs,
            cost,
            semantic: None,
            text,
            insertion_cost: spec.insertion_cost,
            transposition_cost: None,
            grammatical_case: None,
            verb_form: None,
            person_number: None,
            tense: spec.tense,
            insertion_idx: None,
            transposition: false,
        };
        self.rules.get_mut(&lhs).unwrap().push(rule);
        Ok(RuleId { lhs, index })
    }

    /// Adds a nonterminal rule to `lhs`. Rejects RHS length outside `1..=2`
    /// and `transposition_cost` on a non-binary RHS.
    pub fn add_nonterminal_rule(
        &mut self,
        lhs: Symbol,
        spec: NonterminalRuleSpec,
    ) -> Result<RuleId, AuthoringError> {
        if !self.symbols.contains(lhs) {
            return Err(AuthoringError::UnknownSymbol {
                lhs_name: String::new(),
                symbol: lhs,
            });
        }
        let lhs_name = self.lhs_name(lhs);
        let rhs = match spec.rhs.len() {
            1 => Rhs::Unary(spec.rhs[0]),
            2 => Rhs::Binary(spec.rhs[0], spec.rhs[1]),
            n => {
                return Err(AuthoringError::IllFormedRule {
                    lhs_name,
                    reason: format!("nonterminal RHS length must be 1 or 2, got {n}"),
                })
            }
        };
        if spec.transposition_cost.is_some() && !matches!(rhs, Rhs::Binary(_, _)) {
            return Err(AuthoringError::IllFormedRule {
                lhs_name,
                reason: "transposition_cost requires a binary RHS".to_string(),
            });
        }
        for &sym in &spec.rhs {
            if !self.symbols.contains(sym) {
                return Err(AuthoringError::UnknownSymbol { lhs_name, symbol: sym });
            }
        }
        let existing = &self.rules[&lhs];
        if existing.iter().any(|r| r.rhs == rhs) {
            return Err(AuthoringError::DuplicateRule { lhs_name });
        }
        let cost = self.next_cost(lhs, spec.semantic.as_ref());
        let index = existing.len();
        let rule = Rule {
            lhs,
            rhs,
            cost,
            semantic: spec.semantic,
            text: None,
            insertion_cost: None,
            transposition_cost: spec.transposition_cost,
            grammatical_case: spec.grammatical_case,
            verb_form: spec.verb_form,
            person_number: spec.person_number,
            tense: None,
            insertion_idx: None,
            transposition: false,
        };
        self.rules.get_mut(&lhs).unwrap().push(rule);
        Ok(RuleId { lhs, index })
    }

    /// Appends a fully-formed, already-validated rule directly (used by the
    /// edit-rule generator to append derived rules after the author's own).
    pub(crate) fn push_derived_rule(&mut self, rule: Rule) {
        self.rules.get_mut(&rule.lhs).unwrap().push(rule);
    }

    /// The rules registered so far for `lhs`.
    pub fn rules_for(&self, lhs: Symbol) -> &[Rule] {
        &self.rules[&lhs]
    }

    /// Mutable access to a symbol's rule list, for the edit-rule generator.
    pub(crate) fn rules_for_mut(&mut self, lhs: Symbol) -> &mut Vec<Rule> {
        self.rules.get_mut(&lhs).unwrap()
    }

    /// All symbols with at least one rule.
    pub fn symbols_with_rules(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter()
    }

    /// Validates and seals the builder into an immutable [`Grammar`].
    ///
    /// Checks invariants 1 (every RHS symbol exists), 5 (every cost is
    /// finite), and 6 (the start symbol has rules); invariants 2-4 and 7 are
    /// enforced earlier, at rule-insertion and edit-rule-generation time.
    pub fn compile(self) -> Result<Grammar, AuthoringError> {
        let start_symbol = self.start_symbol.ok_or(AuthoringError::NoStartSymbol)?;
        for (&lhs, rules) in &self.rules {
            for rule in rules {
                for sym in rule.rhs.symbols() {
                    if !self.symbols.contains(sym) {
                        return Err(AuthoringError::UnknownSymbol {
                            lhs_name: self.symbols.name(lhs).to_string(),
                            symbol: sym,
                        });
                    }
                }
                if !rule.cost.is_finite() || rule.cost < 0.0 {
                    return Err(AuthoringError::IllFormedRule {
                        lhs_name: self.symbols.name(lhs).to_string(),
                        reason: format!("non-finite or negative cost {}", rule.cost),
                    });
                }
            }
        }
        if self.rules[&start_symbol].is_empty() {
            return Err(AuthoringError::EmptyStartSymbol {
                name: self.symbols.name(start_symbol).to_string(),
            });
        }
        Ok(Grammar {
            symbols: self.symbols,
            rules: self.rules,
            start_symbol,
            deletables: self.deletables,
        })
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        GrammarBuilder::new()
    }
}

/// The sealed, immutable compiled grammar (spec §3, §6). Read-only from here
/// on: the ambiguity detector never mutates it.
#[derive(Debug)]
pub struct Grammar {
    symbols: SymbolTable,
    rules: HashMap<Symbol, Vec<Rule>>,
    start_symbol: Symbol,
    deletables: HashSet<String>,
}

impl Grammar {
    /// The symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The grammar's start symbol.
    pub fn start_symbol(&self) -> Symbol {
        self.start_symbol
    }

    /// `symbol`'s rules, in authoring order followed by derived edit rules.
    pub fn rules(&self, symbol: Symbol) -> &[Rule] {
        self.rules.get(&symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `symbol`'s non-edit (author-written) rules.
    pub fn authored_rules(&self, symbol: Symbol) -> impl Iterator<Item = &Rule> {
        self.rules(symbol).iter().filter(|r| !r.is_edit_rule())
    }

    /// Every rule in the grammar, paired with its id.
    pub fn all_rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.symbols.iter().flat_map(move |sym| {
            self.rules(sym)
                .iter()
                .enumerate()
                .map(move |(index, rule)| (RuleId { lhs: sym, index }, rule))
        })
    }

    /// Whether `word` was declared a deletable stop word.
    pub fn is_deletable(&self, word: &str) -> bool {
        self.deletables.contains(word)
    }

    /// The deletables set.
    pub fn deletables(&self) -> &HashSet<String> {
        &self.deletables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_grammar() -> (GrammarBuilder, Symbol, Symbol) {
        let mut b = GrammarBuilder::new();
        let s = b.new_symbol(&["S"]).unwrap();
        let a = b.new_symbol(&["A"]).unwrap();
        b.set_start_symbol(s);
        (b, s, a)
    }

    #[test]
    fn compile_succeeds_for_unambiguous_unary() {
        let (mut b, s, a) = minimal_grammar();
        b.add_terminal_rule(a, TerminalRuleSpec { text: Some(Text::Literal("x".into())), ..Default::default() }).unwrap();
        b.add_nonterminal_rule(s, NonterminalRuleSpec { rhs: vec![a], ..Default::default() }).unwrap();
        let grammar = b.compile().unwrap();
        assert_eq!(grammar.authored_rules(s).count(), 1);
    }

    #[test]
    fn rejects_duplicate_rhs_on_same_lhs() {
        let (mut b, _s, a) = minimal_grammar();
        b.add_terminal_rule(a, TerminalRuleSpec { text: Some(Text::Literal("x".into())), ..Default::default() }).unwrap();
        let err = b
            .add_terminal_rule(a, TerminalRuleSpec { text: Some(Text::Literal("x".into())), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, AuthoringError::DuplicateRule { .. }));
    }

    #[test]
    fn rejects_ternary_rhs() {
        let (mut b, s, a) = minimal_grammar();
        let c = b.new_symbol(&["C"]).unwrap();
        let err = b
            .add_nonterminal_rule(s, NonterminalRuleSpec { rhs: vec![a, a, c], ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, AuthoringError::IllFormedRule { .. }));
    }

    #[test]
    fn rejects_transposition_cost_on_unary_rhs() {
        let (mut b, s, a) = minimal_grammar();
        let err = b
            .add_nonterminal_rule(
                s,
                NonterminalRuleSpec {
                    rhs: vec![a],
                    transposition_cost: Some(1.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, AuthoringError::IllFormedRule { .. }));
    }

    #[test]
    fn compile_fails_when_start_symbol_has_no_rules() {
        let (b, _s, _a) = minimal_grammar();
        let err = b.compile().unwrap_err();
        assert!(matches!(err, AuthoringError::EmptyStartSymbol { .. }));
    }

    #[test]
    fn cost_increases_deterministically_with_rule_order() {
        let (mut b, _s, a) = minimal_grammar();
        let r0 = b
            .add_terminal_rule(a, TerminalRuleSpec { text: Some(Text::Literal("x".into())), ..Default::default() })
            .unwrap();
        let r1 = b
            .add_terminal_rule(a, TerminalRuleSpec { text: Some(Text::Literal("y".into())), ..Default::default() })
            .unwrap();
        assert_eq!(b.rules_for(a)[r0.index()].cost, 0.0);
        assert!((b.rules_for(a)[r1.index()].cost - 1e-7).abs() < 1e-12);
    }
}
