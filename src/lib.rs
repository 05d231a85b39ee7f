//! A grammar compiler for a natural-language question-answering system: an
//! authoring API for symbols, rules, and semantics; a terminal-set builder
//! for verb conjugation; an edit-rule generator (empty-symbol elimination,
//! transposition, insertion); and a bounded ambiguity detector.
//!
//! The pipeline runs in one direction: author a [`grammar::GrammarBuilder`],
//! populate it directly or through [`terminal_set`]'s conjugation helpers,
//! run [`edit_rules::generate`] once authoring is complete, seal it with
//! [`grammar::GrammarBuilder::compile`], then optionally run
//! [`ambiguity::detect`] over the result.

#![deny(missing_docs)]
#![warn(missing_copy_implementations, trivial_casts, trivial_numeric_casts, unused_import_braces, unused_qualifications)]

pub mod ambiguity;
pub mod diagnostics;
pub mod edit_rules;
pub mod error;
pub mod grammar;
pub mod rule;
pub mod semantic;
pub mod symbol;
pub mod terminal_set;

pub use ambiguity::{Ambiguity, AmbiguityConfig, Tree};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, LogSink, NullSink};
pub use error::{AuthoringError, ConfigError};
pub use grammar::{Grammar, GrammarBuilder, NonterminalRuleSpec, TerminalRuleSpec};
pub use rule::{
    GrammaticalCase, InflectionMap, PersonNumber, Rhs, Rule, RuleId, Tense, Text, VerbForm,
    EMPTY_TERMINAL,
};
pub use semantic::{Semantic, SemanticId, SemanticRegistry};
pub use symbol::{Symbol, SymbolTable};
pub use terminal_set::{build_substitution_set, build_verb_set, build_word_set, VerbDescriptor};
