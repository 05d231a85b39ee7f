//! The diagnostic event sink (spec §6): duplicate-symbol, duplicate-rule,
//! ill-formed-rule, arity-mismatch, and ambiguity-warning events.
//!
//! The teacher gates its `log`/`env_logger` dependency behind a `generation`
//! feature used only by its sentence generator; this crate's `diagnostics`
//! feature plays the analogous role for the compiler's own long-running
//! passes (edit-rule generation, ambiguity detection).

use crate::ambiguity::Ambiguity;
use crate::error::AuthoringError;

/// A single diagnostic event emitted during compilation or ambiguity
/// detection.
#[derive(Debug, Clone)]
pub enum Diagnostic {
    /// An authoring error that aborted compilation.
    Authoring(AuthoringError),
    /// A locally ambiguous nonterminal was found.
    Ambiguity(Ambiguity),
    /// A self-test fixture symbol's ambiguity went undetected.
    SelfTestMiss {
        /// The fixture symbol's name.
        symbol_name: String,
    },
}

/// Receives diagnostics as they are produced. The default sink
/// ([`LogSink`]) forwards to the `log` facade; tests typically use
/// [`CollectingSink`] to assert on what was reported.
pub trait DiagnosticSink {
    /// Records one diagnostic event.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` crate at a severity appropriate to
/// its kind (authoring errors and self-test misses as errors, ambiguity
/// warnings as warnings).
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::Authoring(err) => log::error!("authoring error: {err}"),
            Diagnostic::Ambiguity(ambiguity) => {
                log::warn!(
                    "ambiguity on {}: {}",
                    ambiguity.symbol_name,
                    ambiguity.describe()
                );
            }
            Diagnostic::SelfTestMiss { symbol_name } => {
                log::error!("self-test miss: `{symbol_name}` was not flagged as ambiguous");
            }
        }
    }
}

/// Collects every diagnostic in order, for assertions in tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// All diagnostics reported so far, in report order.
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        CollectingSink::default()
    }

    /// All reported ambiguity findings, in report order.
    pub fn ambiguities(&self) -> impl Iterator<Item = &Ambiguity> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Ambiguity(a) => Some(a),
            _ => None,
        })
    }
}

/// A sink that discards every diagnostic (spec §6's `no_output` benchmark
/// mode).
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
