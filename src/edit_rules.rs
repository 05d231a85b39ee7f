//! The edit-rule generator: empty-symbol elimination, transposition, and
//! insertion rules (spec §4.4), the largest single component by the spec's
//! own budget.
//!
//! The nullable-set and insertable-set computations are both least-fixed-
//! point worklist closures over the authored rule set, the same shape as the
//! teacher's `RhsClosure` (`src/rhs_closure.rs`): seed a `BitVec`/map from
//! directly-satisfying rules, then relax until nothing changes.

use std::collections::HashMap;

use bit_vec::BitVec;

use crate::grammar::GrammarBuilder;
use crate::rule::{Rhs, Rule, Text, EMPTY_TERMINAL};
use crate::symbol::Symbol;

/// The set of nullable symbols (those with a derivation to the empty
/// string), plus the cheapest known cost of deriving each to `ε`.
pub struct NullableSet {
    nullable: BitVec,
    cheapest: HashMap<Symbol, f64>,
}

impl NullableSet {
    /// Computes the nullable set by least-fixed-point iteration over
    /// `builder`'s currently-authored rules (spec §4.4.1).
    pub fn compute(builder: &GrammarBuilder) -> Self {
        let num_syms = builder.symbols().len();
        let mut nullable = BitVec::from_elem(num_syms, false);
        let mut cheapest: HashMap<Symbol, f64> = HashMap::new();

        let mut by_rhs_symbol: HashMap<Symbol, Vec<(Symbol, Vec<Symbol>, f64)>> = HashMap::new();
        let mut work = Vec::new();

        for sym in builder.symbols().iter() {
            for rule in builder.rules_for(sym) {
                match &rule.rhs {
                    Rhs::Terminal(text) if text == EMPTY_TERMINAL => {
                        if !nullable[sym.index()] {
                            nullable.set(sym.index(), true);
                            work.push(sym);
                        }
                        relax(&mut cheapest, sym, rule.cost);
                    }
                    Rhs::Terminal(_) => {}
                    _ => {
                        let rhs_syms = rule.rhs.symbols();
                        for &s in &rhs_syms {
                            by_rhs_symbol
                                .entry(s)
                                .or_default()
                                .push((sym, rhs_syms.clone(), rule.cost));
                        }
                    }
                }
            }
        }

        while let Some(work_sym) = work.pop() {
            let Some(candidates) = by_rhs_symbol.get(&work_sym) else {
                continue;
            };
            for (lhs, rhs_syms, rule_cost) in candidates.clone() {
                if rhs_syms.iter().all(|s| nullable[s.index()]) {
                    let derivation_cost =
                        rule_cost + rhs_syms.iter().map(|s| cheapest[s]).sum::<f64>();
                    if !nullable[lhs.index()] {
                        nullable.set(lhs.index(), true);
                        work.push(lhs);
                    }
                    relax(&mut cheapest, lhs, derivation_cost);
                }
            }
        }

        NullableSet { nullable, cheapest }
    }

    /// True if `sym` can derive the empty string.
    pub fn is_nullable(&self, sym: Symbol) -> bool {
        self.nullable[sym.index()]
    }

    /// The cheapest known cost of deriving `sym` to `ε`, if nullable.
    pub fn cheapest_to_empty(&self, sym: Symbol) -> Option<f64> {
        self.cheapest.get(&sym).copied()
    }
}

fn relax(best: &mut HashMap<Symbol, f64>, sym: Symbol, cost: f64) {
    match best.get(&sym) {
        Some(&existing) if existing <= cost => {}
        _ => {
            best.insert(sym, cost);
        }
    }
}

/// Generates every edit rule from the authored grammar in a single pass:
/// insertion rules first, then transposition rules, then empty-symbol
/// elimination rules. Insertion and transposition are both computed from a
/// snapshot of the authored (non-edit) binary rules, so derived rules are
/// never themselves re-examined (spec §4.4.3's termination requirement).
pub fn generate(builder: &mut GrammarBuilder) {
    let nullable = NullableSet::compute(builder);
    let insertable = insertable_closure(builder);
    let display_text = display_text_closure(builder);

    let authored_binary: Vec<(Symbol, Rule)> = builder
        .symbols_with_rules()
        .flat_map(|sym| {
            builder
                .rules_for(sym)
                .iter()
                .filter(|r| !r.is_edit_rule() && matches!(r.rhs, Rhs::Binary(_, _)))
                .cloned()
                .map(move |r| (sym, r))
        })
        .collect();

    for (lhs, rule) in &authored_binary {
        generate_insertion_rules(builder, *lhs, rule, &insertable, &display_text);
    }
    for (lhs, rule) in &authored_binary {
        generate_transposition_rule(builder, *lhs, rule);
    }

    generate_empty_elimination_rules(builder, &nullable);
}

fn rhs_exists(builder: &GrammarBuilder, lhs: Symbol, rhs: &Rhs) -> bool {
    builder.rules_for(lhs).iter().any(|r| &r.rhs == rhs)
}

/// §4.4.1: for every binary rule with a nullable side, add the derived rule
/// that keeps only the non-nullable sibling.
fn generate_empty_elimination_rules(builder: &mut GrammarBuilder, nullable: &NullableSet) {
    let authored_binary: Vec<(Symbol, Rule)> = builder
        .symbols_with_rules()
        .flat_map(|sym| {
            builder
                .rules_for(sym)
                .iter()
                .filter(|r| !r.is_edit_rule())
                .cloned()
                .map(move |r| (sym, r))
        })
        .collect();

    for (lhs, rule) in authored_binary {
        let Rhs::Binary(a, b) = rule.rhs else { continue };
        for (nullable_side, kept) in [(a, b), (b, a)] {
            if !nullable.is_nullable(nullable_side) {
                continue;
            }
            let derived_rhs = Rhs::Unary(kept);
            if rhs_exists(builder, lhs, &derived_rhs) {
                continue;
            }
            let cost = rule.cost + nullable.cheapest_to_empty(nullable_side).unwrap_or(0.0);
            builder.push_derived_rule(Rule {
                lhs,
                rhs: derived_rhs,
                cost,
                semantic: rule.semantic.clone(),
                text: None,
                insertion_cost: None,
                transposition_cost: None,
                grammatical_case: rule.grammatical_case,
                verb_form: rule.verb_form,
                person_number: rule.person_number,
                tense: None,
                insertion_idx: None,
                transposition: false,
            });
        }
    }
}

/// §4.4.2: for every binary rule with a `transposition_cost`, add the
/// reversed-order derived rule, unless it already exists.
fn generate_transposition_rule(builder: &mut GrammarBuilder, lhs: Symbol, rule: &Rule) {
    let Some(cost_penalty) = rule.transposition_cost else {
        return;
    };
    let Rhs::Binary(a, b) = rule.rhs else { return };
    let derived_rhs = Rhs::Binary(b, a);
    if rhs_exists(builder, lhs, &derived_rhs) {
        return;
    }
    builder.push_derived_rule(Rule {
        lhs,
        rhs: derived_rhs,
        cost: rule.cost + cost_penalty,
        semantic: rule.semantic.clone(),
        text: None,
        insertion_cost: None,
        transposition_cost: None,
        grammatical_case: rule.grammatical_case,
        verb_form: rule.verb_form,
        person_number: rule.person_number,
        tense: None,
        insertion_idx: None,
        transposition: true,
    });
}

/// The cheapest known all-insertable-terminals derivation of a symbol: the
/// summed insertion cost of its leaves, and the text that derivation yields
/// by the concatenation rules of spec §4.4.3.
#[derive(Clone)]
struct Insertable {
    cost: f64,
    text: Text,
}

fn update_insertable(best: &mut HashMap<Symbol, Insertable>, sym: Symbol, candidate: Insertable) -> bool {
    match best.get(&sym) {
        Some(existing) if existing.cost <= candidate.cost => false,
        _ => {
            best.insert(sym, candidate);
            true
        }
    }
}

fn terminal_insertion_cost(builder: &GrammarBuilder, rule: &Rule, text: &str) -> Option<f64> {
    if let Some(cost) = rule.insertion_cost {
        return Some(cost);
    }
    // A terminal matching a declared deletable is elidable for free, even
    // without an explicit `insertion_cost` on that particular rule.
    // `deletables` live on the sealed `Grammar`, not the builder, so authors
    // register them on the builder and we read them back the same way.
    if builder.is_deletable_during_authoring(text) {
        return Some(0.0);
    }
    None
}

/// The displayable text of a symbol via any derivation down to terminal
/// rules' own text, not just insertion-cost-bearing ones — used to find the
/// kept side's own text when synthesizing an insertion rule around it
/// (spec §4.4.3's concatenation, same fixed-point shape as
/// `insertable_closure` but unconditional on insertion cost).
fn display_text_closure(builder: &GrammarBuilder) -> HashMap<Symbol, Text> {
    let mut best: HashMap<Symbol, Text> = HashMap::new();

    for sym in builder.symbols_with_rules() {
        for rule in builder.rules_for(sym) {
            if let Rhs::Terminal(text) = &rule.rhs {
                if text == EMPTY_TERMINAL {
                    continue;
                }
                let display = rule.text.clone().unwrap_or_else(|| Text::Literal(text.clone()));
                best.entry(sym).or_insert(display);
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for sym in builder.symbols_with_rules() {
            if best.contains_key(&sym) {
                continue;
            }
            for rule in builder.rules_for(sym) {
                let candidate = match &rule.rhs {
                    Rhs::Unary(y) => best.get(y).cloned(),
                    Rhs::Binary(a, b) => match (best.get(a), best.get(b)) {
                        (Some(ta), Some(tb)) => Some(ta.concat(tb)),
                        _ => None,
                    },
                    Rhs::Terminal(_) => None,
                };
                if let Some(candidate) = candidate {
                    best.insert(sym, candidate);
                    changed = true;
                    break;
                }
            }
        }
    }

    best
}

fn insertable_closure(builder: &GrammarBuilder) -> HashMap<Symbol, Insertable> {
    let mut best: HashMap<Symbol, Insertable> = HashMap::new();

    for sym in builder.symbols_with_rules() {
        for rule in builder.rules_for(sym) {
            if let Rhs::Terminal(text) = &rule.rhs {
                if text == EMPTY_TERMINAL {
                    continue;
                }
                if let Some(cost) = terminal_insertion_cost(builder, rule, text) {
                    let display = rule
                        .text
                        .clone()
                        .unwrap_or_else(|| Text::Literal(text.clone()));
                    update_insertable(&mut best, sym, Insertable { cost, text: display });
                }
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for sym in builder.symbols_with_rules() {
            for rule in builder.rules_for(sym) {
                let candidate = match &rule.rhs {
                    Rhs::Unary(y) => best.get(y).cloned(),
                    Rhs::Binary(a, b) => match (best.get(a), best.get(b)) {
                        (Some(ia), Some(ib)) => Some(Insertable {
                            cost: ia.cost + ib.cost,
                            text: ia.text.concat(&ib.text),
                        }),
                        _ => None,
                    },
                    Rhs::Terminal(_) => None,
                };
                if let Some(candidate) = candidate {
                    if update_insertable(&mut best, sym, candidate) {
                        changed = true;
                    }
                }
            }
        }
    }

    best
}

/// §4.4.3: for a binary rule whose `a` (or `b`) side derives entirely to
/// insertable terminals, synthesize a unary rule over the other side, with
/// text equal to the elided side's text concatenated with the kept side's
/// own displayable text, in original RHS order.
fn generate_insertion_rules(
    builder: &mut GrammarBuilder,
    lhs: Symbol,
    rule: &Rule,
    insertable: &HashMap<Symbol, Insertable>,
    display_text: &HashMap<Symbol, Text>,
) {
    let Rhs::Binary(a, b) = rule.rhs else { return };
    for (insertable_idx, elided, kept) in [(0u8, a, b), (1u8, b, a)] {
        let Some(info) = insertable.get(&elided) else {
            continue;
        };
        let Some(kept_text) = display_text.get(&kept) else {
            continue;
        };
        let derived_rhs = Rhs::Unary(kept);
        if rhs_exists(builder, lhs, &derived_rhs) {
            continue;
        }
        let text = if insertable_idx == 0 {
            info.text.concat(kept_text)
        } else {
            kept_text.concat(&info.text)
        };
        builder.push_derived_rule(Rule {
            lhs,
            rhs: derived_rhs,
            cost: rule.cost + info.cost,
            semantic: rule.semantic.clone(),
            text: Some(text),
            insertion_cost: None,
            transposition_cost: None,
            grammatical_case: rule.grammatical_case,
            verb_form: rule.verb_form,
            person_number: rule.person_number,
            tense: None,
            insertion_idx: Some(insertable_idx),
            transposition: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, NonterminalRuleSpec, TerminalRuleSpec};

    fn sym_rule(builder: &mut GrammarBuilder, name: &str, text: &str) -> Symbol {
        let sym = builder.new_symbol(&[name]).unwrap();
        builder
            .add_terminal_rule(
                sym,
                TerminalRuleSpec {
                    text: Some(Text::Literal(text.into())),
                    ..Default::default()
                },
            )
            .unwrap();
        sym
    }

    #[test]
    fn empty_elimination_keeps_non_nullable_sibling() {
        let mut b = GrammarBuilder::new();
        let x = b.new_symbol(&["X"]).unwrap();
        let a = b.new_symbol(&["A"]).unwrap();
        let bb = b.new_symbol(&["B"]).unwrap();
        b.add_terminal_rule(a, TerminalRuleSpec { empty: true, ..Default::default() }).unwrap();
        let _ = sym_rule(&mut b, "unused", "ignored"); // keep symbol table non-trivial
        b.add_terminal_rule(
            bb,
            TerminalRuleSpec { text: Some(Text::Literal("y".into())), ..Default::default() },
        )
        .unwrap();
        b.add_nonterminal_rule(x, NonterminalRuleSpec { rhs: vec![a, bb], ..Default::default() }).unwrap();
        generate(&mut b);
        let derived = b
            .rules_for(x)
            .iter()
            .find(|r| matches!(r.rhs, Rhs::Unary(s) if s == bb))
            .expect("expected X -> B derived rule");
        assert!(derived.cost > 0.0);
    }

    #[test]
    fn transposition_is_idempotent() {
        let mut b = GrammarBuilder::new();
        let x = b.new_symbol(&["X"]).unwrap();
        let a = sym_rule(&mut b, "A", "a");
        let bb = sym_rule(&mut b, "B", "b");
        b.add_nonterminal_rule(
            x,
            NonterminalRuleSpec { rhs: vec![a, bb], transposition_cost: Some(1.0), ..Default::default() },
        )
        .unwrap();
        generate(&mut b);
        let transposed = b.rules_for(x).iter().filter(|r| r.transposition).count();
        assert_eq!(transposed, 1);
    }

    #[test]
    fn insertion_text_composition_matches_spec_example() {
        let mut b = GrammarBuilder::new();
        let x = b.new_symbol(&["X"]).unwrap();
        let a = b.new_symbol(&["A"]).unwrap();
        let bb = b.new_symbol(&["B"]).unwrap();
        b.add_terminal_rule(
            a,
            TerminalRuleSpec {
                text: Some(Text::Literal("the".into())),
                insertion_cost: Some(1.0),
                ..Default::default()
            },
        )
        .unwrap();
        let map = crate::rule::InflectionMap {
            one_sg: Some("go".into()),
            three_sg: Some("goes".into()),
            pl: Some("go".into()),
            past: Some("went".into()),
            ..Default::default()
        };
        b.add_terminal_rule(
            bb,
            TerminalRuleSpec { text: Some(Text::Inflected(map)), surface: Some("go".into()), ..Default::default() },
        )
        .unwrap();
        b.add_nonterminal_rule(x, NonterminalRuleSpec { rhs: vec![a, bb], ..Default::default() }).unwrap();
        let original_cost = b.rules_for(x)[0].cost;
        generate(&mut b);
        let derived = b
            .rules_for(x)
            .iter()
            .find(|r| r.insertion_idx == Some(0))
            .expect("expected insertion rule eliding A");
        assert!((derived.cost - (original_cost + 1.0)).abs() < 1e-12);
        match derived.text.as_ref().unwrap() {
            Text::Inflected(m) => {
                assert_eq!(m.one_sg.as_deref(), Some("the go"));
                assert_eq!(m.three_sg.as_deref(), Some("the goes"));
                assert_eq!(m.past.as_deref(), Some("the went"));
            }
            Text::Literal(_) => panic!("expected inflected derived text"),
        }
    }

    #[test]
    fn edit_rules_never_set_both_insertion_idx_and_transposition() {
        let mut b = GrammarBuilder::new();
        let x = b.new_symbol(&["X"]).unwrap();
        let a = b.new_symbol(&["A"]).unwrap();
        let bb = b.new_symbol(&["B"]).unwrap();
        b.add_terminal_rule(
            a,
            TerminalRuleSpec { text: Some(Text::Literal("the".into())), insertion_cost: Some(1.0), ..Default::default() },
        )
        .unwrap();
        b.add_terminal_rule(bb, TerminalRuleSpec { text: Some(Text::Literal("y".into())), ..Default::default() }).unwrap();
        b.add_nonterminal_rule(
            x,
            NonterminalRuleSpec { rhs: vec![a, bb], transposition_cost: Some(0.5), ..Default::default() },
        )
        .unwrap();
        generate(&mut b);
        for rule in b.rules_for(x) {
            assert!(!(rule.insertion_idx.is_some() && rule.transposition));
        }
    }
}
