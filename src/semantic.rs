//! Named semantic functions and their composition ("reduction").
//!
//! The teacher's `history.rs` composes per-rule histories through traits like
//! `RewriteSequence`; semantics compose the same way but are identified by
//! name and stored in an explicit registry rather than attached via trait
//! dispatch, since the spec treats them as authored, inspectable values.

use std::rc::Rc;

use crate::error::AuthoringError;

/// A semantic function: `{name, cost, min_params, max_params}` (spec §3).
/// `Atomic` semantics are authored directly; `Reduction` semantics are
/// produced by [`SemanticRegistry::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub struct Semantic {
    /// The semantic's name, as authored or synthesized for a reduction.
    pub name: String,
    /// This semantic's own cost contribution.
    pub cost: f64,
    /// Minimum accepted parameter count.
    pub min_params: u8,
    /// Maximum accepted parameter count.
    pub max_params: u8,
    kind: SemanticKind,
}

#[derive(Debug, Clone, PartialEq)]
enum SemanticKind {
    Atomic,
    Reduction {
        outer: Rc<Semantic>,
        inner: Rc<Semantic>,
    },
}

impl Semantic {
    /// Total cost, summing a reduction's outer and inner costs.
    pub fn total_cost(&self) -> f64 {
        match &self.kind {
            SemanticKind::Atomic => self.cost,
            SemanticKind::Reduction { outer, inner } => outer.total_cost() + inner.total_cost(),
        }
    }

    /// True if this semantic is the result of `reduce`.
    pub fn is_reduction(&self) -> bool {
        matches!(self.kind, SemanticKind::Reduction { .. })
    }
}

/// A handle to an interned [`Semantic`], cheap to copy and compare.
#[derive(Debug, Clone)]
pub struct SemanticId(pub(crate) Rc<Semantic>);

impl PartialEq for SemanticId {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SemanticId {}

impl SemanticId {
    /// Dereferences to the underlying semantic.
    pub fn get(&self) -> &Semantic {
        &self.0
    }
}

/// The grammar's semantic registry: authors atomic semantics and composes
/// them via `reduce`.
#[derive(Debug, Default)]
pub struct SemanticRegistry {
    by_name: Vec<Rc<Semantic>>,
}

impl SemanticRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        SemanticRegistry::default()
    }

    /// Authors a new atomic semantic.
    pub fn atomic(&mut self, name: impl Into<String>, cost: f64, min_params: u8, max_params: u8) -> SemanticId {
        let semantic = Rc::new(Semantic {
            name: name.into(),
            cost,
            min_params,
            max_params,
            kind: SemanticKind::Atomic,
        });
        self.by_name.push(semantic.clone());
        SemanticId(semantic)
    }

    /// Composes `outer(inner(...))`. The inner semantic's `max_params` must
    /// fit within one parameter slot of the outer semantic, mirroring how a
    /// reduced nonterminal occupies a single argument position of its parent.
    pub fn reduce(&mut self, outer: &SemanticId, inner: &SemanticId) -> Result<SemanticId, AuthoringError> {
        let outer_slot = outer.get().max_params;
        let inner_max = inner.get().max_params;
        if inner_max > outer_slot {
            return Err(AuthoringError::ArityMismatch {
                outer: outer.get().name.clone(),
                inner: inner.get().name.clone(),
                inner_max,
                outer_slot,
            });
        }
        let composite = Rc::new(Semantic {
            name: format!("{}({})", outer.get().name, inner.get().name),
            cost: outer.get().cost + inner.get().cost,
            min_params: inner.get().min_params,
            max_params: inner_max,
            kind: SemanticKind::Reduction {
                outer: outer.0.clone(),
                inner: inner.0.clone(),
            },
        });
        self.by_name.push(composite.clone());
        Ok(SemanticId(composite))
    }

    /// The number of semantics ever registered (atomic and composed).
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if no semantics have been registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
