//! Authoring and configuration error taxonomy.
//!
//! The teacher library panics on grammar misuse; this crate's authoring API
//! is meant to be driven by generated domain code, so authoring mistakes are
//! reported as typed errors instead (spec §7).

use thiserror::Error;

use crate::symbol::Symbol;

/// Errors raised while authoring a grammar, fatal to the rule or symbol that
/// triggered them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthoringError {
    /// A symbol with this name was already registered.
    #[error("duplicate symbol `{name}`")]
    DuplicateSymbol {
        /// The offending joined name.
        name: String,
    },
    /// One or more name parts were empty, or no parts were given at all.
    #[error("ill-formed symbol name: {parts:?}")]
    IllFormedName {
        /// The name parts as given.
        parts: Vec<String>,
    },
    /// A rule violated the terminal or nonterminal schema.
    #[error("ill-formed rule on `{lhs_name}`: {reason}")]
    IllFormedRule {
        /// The rule's LHS symbol name.
        lhs_name: String,
        /// Why the rule was rejected.
        reason: String,
    },
    /// The same RHS was already registered for this LHS.
    #[error("duplicate rule on `{lhs_name}`")]
    DuplicateRule {
        /// The rule's LHS symbol name.
        lhs_name: String,
    },
    /// A rule referenced a symbol not present in the grammar.
    #[error("rule on `{lhs_name}` references unknown symbol {symbol}")]
    UnknownSymbol {
        /// The rule's LHS symbol name.
        lhs_name: String,
        /// The dangling reference.
        symbol: Symbol,
    },
    /// `reduce(outer, inner)` violated arity.
    #[error("semantic arity mismatch: `{outer}` cannot take `{inner}` (max_params {inner_max} > {outer_slot})")]
    ArityMismatch {
        /// The outer semantic's name.
        outer: String,
        /// The inner semantic's name.
        inner: String,
        /// The inner semantic's declared maximum parameter count.
        inner_max: u8,
        /// The parameter slot available on the outer semantic.
        outer_slot: u8,
    },
    /// `compile()` found the start symbol has no rules.
    #[error("start symbol `{name}` has no rules")]
    EmptyStartSymbol {
        /// The start symbol's name.
        name: String,
    },
    /// `compile()` was called before a start symbol was designated.
    #[error("no start symbol was designated")]
    NoStartSymbol,
}

/// Errors in detector configuration (spec §6).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `syms_limit` must be at least 1.
    #[error("syms_limit must be >= 1, got {0}")]
    SymsLimitTooSmall(usize),
}
