//! Grammar rules: the discriminated `Rhs` union plus the shared header of
//! cost, semantic, and conjugation-tag fields every rule carries (spec §3,
//! design note on tagged rule variants in §9).

use std::collections::HashMap;

use crate::semantic::SemanticId;
use crate::symbol::Symbol;

/// The distinguished empty-terminal marker (`ε`).
pub const EMPTY_TERMINAL: &str = "\u{03B5}";

/// A rule's right-hand side: a single terminal string, or one or two symbol
/// references. `terminal()` / the spec's boolean `terminal` field falls out
/// of which variant this is.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Rhs {
    /// A terminal rule's surface form, or [`EMPTY_TERMINAL`].
    Terminal(String),
    /// A unary nonterminal rule, or a derived insertion rule.
    Unary(Symbol),
    /// A binary nonterminal rule.
    Binary(Symbol, Symbol),
}

impl Rhs {
    /// True for [`Rhs::Terminal`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, Rhs::Terminal(_))
    }

    /// The rule's symbol references, in order. Empty for terminal rules.
    pub fn symbols(&self) -> Vec<Symbol> {
        match self {
            Rhs::Terminal(_) => Vec::new(),
            Rhs::Unary(sym) => vec![*sym],
            Rhs::Binary(a, b) => vec![*a, *b],
        }
    }
}

/// Grammatical case tag, propagated to the parser for conjugation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum GrammaticalCase {
    /// Nominative case ("he").
    Nominative,
    /// Objective case ("him").
    Objective,
}

/// Verb form tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum VerbForm {
    /// Present tense.
    Present,
    /// Past tense.
    Past,
    /// Present participle ("-ing").
    PresentParticiple,
    /// Past participle.
    PastParticiple,
    /// Present subjunctive.
    PresentSubjunctive,
}

/// Person/number tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum PersonNumber {
    /// First or second person, or plural third person.
    OneOrThreePl,
    /// Third person singular.
    ThreeSg,
}

/// Tense tag carried by inflected terminal rules derived from `past`-family
/// verb forms (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Tense {
    /// Past tense.
    Past,
}

/// A keyed record of surface forms, carried as a terminal rule's `text` until
/// parse-time conjugation (spec §3, glossary).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct InflectionMap {
    /// First/second person singular and plural form ("I/we/you like").
    pub one_sg: Option<String>,
    /// Third person singular form ("she likes").
    pub three_sg: Option<String>,
    /// Plural form ("they like").
    pub pl: Option<String>,
    /// Past tense form.
    pub past: Option<String>,
    /// Present subjunctive form.
    pub present_subjunctive: Option<String>,
    /// Present participle form.
    pub present_participle: Option<String>,
    /// Past participle form.
    pub past_participle: Option<String>,
}

impl InflectionMap {
    /// Applies `f` to every populated form, producing a new map.
    pub fn map_forms(&self, mut f: impl FnMut(&str) -> String) -> InflectionMap {
        InflectionMap {
            one_sg: self.one_sg.as_deref().map(&mut f),
            three_sg: self.three_sg.as_deref().map(&mut f),
            pl: self.pl.as_deref().map(&mut f),
            past: self.past.as_deref().map(&mut f),
            present_subjunctive: self.present_subjunctive.as_deref().map(&mut f),
            present_participle: self.present_participle.as_deref().map(&mut f),
            past_participle: self.past_participle.as_deref().map(&mut f),
        }
    }

    /// Combines two maps key-by-key with `f`, missing keys on either side
    /// passing the other side through unchanged.
    pub fn zip_with(
        &self,
        other: &InflectionMap,
        mut f: impl FnMut(&str, &str) -> String,
    ) -> InflectionMap {
        let mut combine = |a: &Option<String>, b: &Option<String>| match (a, b) {
            (Some(a), Some(b)) => Some(f(a, b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        InflectionMap {
            one_sg: combine(&self.one_sg, &other.one_sg),
            three_sg: combine(&self.three_sg, &other.three_sg),
            pl: combine(&self.pl, &other.pl),
            past: combine(&self.past, &other.past),
            present_subjunctive: combine(&self.present_subjunctive, &other.present_subjunctive),
            present_participle: combine(&self.present_participle, &other.present_participle),
            past_participle: combine(&self.past_participle, &other.past_participle),
        }
    }

    /// All non-empty surface forms, deduplicated in insertion order. Used by
    /// the terminal-set builder to emit one rule per distinct form.
    pub fn distinct_forms(&self) -> Vec<(&'static str, &str)> {
        let candidates: [(&'static str, &Option<String>); 7] = [
            ("oneSg", &self.one_sg),
            ("threeSg", &self.three_sg),
            ("pl", &self.pl),
            ("past", &self.past),
            ("presentSubjunctive", &self.present_subjunctive),
            ("presentParticiple", &self.present_participle),
            ("pastParticiple", &self.past_participle),
        ];
        let mut seen = HashMap::new();
        let mut out = Vec::new();
        for (key, value) in candidates {
            if let Some(text) = value {
                if !seen.contains_key(text.as_str()) {
                    seen.insert(text.as_str(), ());
                    out.push((key, text.as_str()));
                }
            }
        }
        out
    }
}

/// A terminal rule's display text: a literal string, or an inflection map
/// used for downstream conjugation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Text {
    /// A fixed surface string.
    Literal(String),
    /// A conjugation-sensitive set of surface strings.
    Inflected(InflectionMap),
}

impl Text {
    /// Concatenates two texts per spec §4.4.3: string+string joins with a
    /// single space (leading space collapsed), a map absorbs a plain string
    /// on either side by appending/prepending it to every form, and two maps
    /// combine key-by-key.
    pub fn concat(&self, other: &Text) -> Text {
        fn join(a: &str, b: &str) -> String {
            if a.is_empty() {
                b.to_string()
            } else if b.is_empty() {
                a.to_string()
            } else {
                format!("{a} {b}")
            }
        }

        match (self, other) {
            (Text::Literal(a), Text::Literal(b)) => Text::Literal(join(a, b)),
            (Text::Inflected(map), Text::Literal(s)) => {
                Text::Inflected(map.map_forms(|form| join(form, s)))
            }
            (Text::Literal(s), Text::Inflected(map)) => {
                Text::Inflected(map.map_forms(|form| join(s, form)))
            }
            (Text::Inflected(a), Text::Inflected(b)) => {
                Text::Inflected(a.zip_with(b, join))
            }
        }
    }

    /// The literal surface string, if this text is not inflected.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Text::Literal(s) => Some(s),
            Text::Inflected(_) => None,
        }
    }
}

/// A single grammar production, `lhs -> rhs`, with the full set of optional
/// attributes from spec §3.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// The production's left-hand side.
    pub lhs: Symbol,
    /// The production's right-hand side.
    pub rhs: Rhs,
    /// `(index within lhs's rule list) * 1e-7 + semantic.cost`.
    pub cost: f64,
    /// A nonterminal rule's semantic function, if any.
    pub semantic: Option<SemanticId>,
    /// A terminal rule's display text, or an insertion rule's synthesized
    /// text.
    pub text: Option<Text>,
    /// Marks a terminal rule as insertable, at this cost.
    pub insertion_cost: Option<f64>,
    /// Marks a binary nonterminal rule as transposable, at this cost.
    pub transposition_cost: Option<f64>,
    /// Grammatical case tag.
    pub grammatical_case: Option<GrammaticalCase>,
    /// Verb form tag.
    pub verb_form: Option<VerbForm>,
    /// Person/number tag.
    pub person_number: Option<PersonNumber>,
    /// Tense tag (only ever `Past`, attached to `past`-family terminal
    /// rules by the terminal-set builder).
    pub tense: Option<Tense>,
    /// Set only on a generated insertion rule: which RHS position of the
    /// original binary rule was synthesized away.
    pub insertion_idx: Option<u8>,
    /// Set only on a generated transposition rule.
    pub transposition: bool,
}

impl Rule {
    /// True if this is an edit rule synthesized by the edit-rule generator
    /// (spec §4.5: excluded from ambiguity enumeration by construction).
    pub fn is_edit_rule(&self) -> bool {
        self.insertion_idx.is_some() || self.transposition
    }

    /// True if this production is a terminal rule.
    pub fn is_terminal(&self) -> bool {
        self.rhs.is_terminal()
    }
}

/// A unique id for a rule within a compiled or in-progress grammar: the rule
/// list of `lhs`, and the rule's index in that list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RuleId {
    pub(crate) lhs: Symbol,
    pub(crate) index: usize,
}

impl RuleId {
    /// The rule's LHS symbol.
    pub fn lhs(self) -> Symbol {
        self.lhs
    }

    /// The rule's index within `lhs`'s rule list.
    pub fn index(self) -> usize {
        self.index
    }
}
