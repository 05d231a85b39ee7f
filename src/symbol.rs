//! Grammar symbols and the registry that interns them.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

use crate::error::AuthoringError;

/// A numeric symbol id. `NonZeroU32`-backed so `Option<Symbol>` is a single
/// word, the way the teacher's `cfg-symbol` crate represents symbols.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(NonZeroU32);

impl Symbol {
    fn from_index(index: usize) -> Self {
        Symbol(NonZeroU32::new(index as u32 + 1).expect("index + 1 is never zero"))
    }

    /// This symbol's dense index, suitable for indexing bit vectors and
    /// parallel arrays.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.get())
    }
}

/// Registry mapping symbol names to their interned `Symbol` and back.
///
/// Unlike the teacher's `SymbolSource`, which is a free-standing generator,
/// this table also owns the name, matching the spec's requirement that a
/// symbol's name be a stable, queryable identifier.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolTable {
    names: Vec<String>,
    by_name: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Creates an empty symbol table.
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Interns a fresh symbol from its dot-joined name parts.
    ///
    /// Fails with `DuplicateSymbol` if the joined name is already registered,
    /// or `IllFormedName` if any part is empty.
    pub fn new_symbol(&mut self, name_parts: &[&str]) -> Result<Symbol, AuthoringError> {
        if name_parts.is_empty() || name_parts.iter().any(|part| part.is_empty()) {
            return Err(AuthoringError::IllFormedName {
                parts: name_parts.iter().map(|s| s.to_string()).collect(),
            });
        }
        let name = name_parts.join(".");
        if self.by_name.contains_key(&name) {
            return Err(AuthoringError::DuplicateSymbol { name });
        }
        let symbol = Symbol::from_index(self.names.len());
        self.names.push(name.clone());
        self.by_name.insert(name, symbol);
        Ok(symbol)
    }

    /// Looks up a symbol by its full joined name.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.by_name.get(name).copied()
    }

    /// Returns the name a symbol was registered under.
    pub fn name(&self, symbol: Symbol) -> &str {
        &self.names[symbol.index()]
    }

    /// The number of registered symbols.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if no symbols have been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `symbol` was produced by this table (cheap bounds check, used
    /// to validate RHS references at compile time).
    pub fn contains(&self, symbol: Symbol) -> bool {
        symbol.index() < self.names.len()
    }

    /// Iterates over all registered symbols in registration order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.names.len()).map(Symbol::from_index)
    }
}
