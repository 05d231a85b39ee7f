//! Terminal-set builder: thin constructors over the rule API that turn a
//! verb or word-set descriptor into one terminal rule per distinct surface
//! form (spec §4.3).
//!
//! Grounded on the same "one declarative item rewrites into many grammar
//! rules" shape as the teacher's sequence-rewriting pass
//! (`src/sequence_destination.rs`, `src/sequence/rewrite.rs`), specialized
//! here to verb conjugation instead of repetition counts.

use crate::error::AuthoringError;
use crate::grammar::{GrammarBuilder, TerminalRuleSpec};
use crate::rule::{InflectionMap, Tense, Text};
use crate::symbol::Symbol;

/// The surface forms of a verb, as authored. Mirrors spec §4.3's descriptor
/// fields exactly; `past`-family forms are those carrying `Tense::Past`
/// downstream.
#[derive(Clone, Debug, Default)]
pub struct VerbDescriptor {
    /// First/second person singular and plural form.
    pub one_sg: String,
    /// Third person singular form.
    pub three_sg: String,
    /// Plural form.
    pub pl: String,
    /// Past tense form.
    pub past: Option<String>,
    /// Present subjunctive form.
    pub present_subjunctive: Option<String>,
    /// Present participle form.
    pub present_participle: Option<String>,
    /// Past participle form.
    pub past_participle: Option<String>,
}

impl VerbDescriptor {
    fn to_inflection_map(&self) -> InflectionMap {
        InflectionMap {
            one_sg: Some(self.one_sg.clone()),
            three_sg: Some(self.three_sg.clone()),
            pl: Some(self.pl.clone()),
            past: self.past.clone(),
            present_subjunctive: self.present_subjunctive.clone(),
            present_participle: self.present_participle.clone(),
            past_participle: self.past_participle.clone(),
        }
    }

    /// The forms considered part of the "past family" for tense tagging.
    fn is_past_family_key(key: &str) -> bool {
        matches!(key, "past" | "pastParticiple")
    }
}

/// Builds a verb set: a fresh nonterminal symbol with one terminal rule per
/// distinct surface form in `descriptor`, all sharing the same inflection
/// map. If `insertion_cost` is given, it is attached only to the first
/// emitted rule (spec §4.3's "first rule of the first accepted verb set").
pub fn build_verb_set(
    builder: &mut GrammarBuilder,
    name_parts: &[&str],
    descriptor: &VerbDescriptor,
    insertion_cost: Option<f64>,
) -> Result<Symbol, AuthoringError> {
    let symbol = builder.new_symbol(name_parts)?;
    let map = descriptor.to_inflection_map();
    add_forms(builder, symbol, &map, insertion_cost)?;
    Ok(symbol)
}

/// Builds a substitution set: like [`build_verb_set`], but every emitted
/// rule's `text` is `canonical`'s inflection map rather than the
/// descriptor's own, so a parse matching any of this set's surface forms
/// normalizes to the canonical surface string (spec §4.3).
pub fn build_substitution_set(
    builder: &mut GrammarBuilder,
    name_parts: &[&str],
    descriptor: &VerbDescriptor,
    canonical: &VerbDescriptor,
) -> Result<Symbol, AuthoringError> {
    let symbol = builder.new_symbol(name_parts)?;
    let surface_forms = descriptor.to_inflection_map();
    let canonical_map = canonical.to_inflection_map();
    add_forms_with_display(builder, symbol, &surface_forms, &canonical_map, None)?;
    Ok(symbol)
}

fn add_forms(
    builder: &mut GrammarBuilder,
    symbol: Symbol,
    map: &InflectionMap,
    insertion_cost: Option<f64>,
) -> Result<(), AuthoringError> {
    add_forms_with_display(builder, symbol, map, map, insertion_cost)
}

/// Adds one terminal rule per distinct surface form in `surface_forms`
/// (duplicate forms collapse silently), with `display` as the shared `text`
/// every such rule carries.
fn add_forms_with_display(
    builder: &mut GrammarBuilder,
    symbol: Symbol,
    surface_forms: &InflectionMap,
    display: &InflectionMap,
    insertion_cost: Option<f64>,
) -> Result<(), AuthoringError> {
    let mut first = true;
    for (key, form) in surface_forms.distinct_forms() {
        let tense = if VerbDescriptor::is_past_family_key(key) {
            Some(Tense::Past)
        } else {
            None
        };
        builder.add_terminal_rule(
            symbol,
            TerminalRuleSpec {
                surface: Some(form.to_string()),
                text: Some(Text::Inflected(display.clone())),
                insertion_cost: if first { insertion_cost } else { None },
                empty: false,
                tense,
            },
        )?;
        first = false;
    }
    Ok(())
}

/// Builds a plain word set (no conjugation, e.g. a stop-word or determiner
/// list): one terminal rule per distinct literal surface string.
pub fn build_word_set(
    builder: &mut GrammarBuilder,
    name_parts: &[&str],
    words: &[&str],
    insertion_cost: Option<f64>,
) -> Result<Symbol, AuthoringError> {
    let symbol = builder.new_symbol(name_parts)?;
    let mut seen = std::collections::HashSet::new();
    let mut first = true;
    for &word in words {
        if !seen.insert(word) {
            continue;
        }
        builder.add_terminal_rule(
            symbol,
            TerminalRuleSpec {
                surface: None,
                text: Some(Text::Literal(word.to_string())),
                insertion_cost: if first { insertion_cost } else { None },
                empty: false,
                tense: None,
            },
        )?;
        first = false;
    }
    Ok(symbol)
}
