//! Error taxonomy for graph mutations.
//!
//! Mutating primitives return `Err` without touching the graph, so a
//! failed call never leaves partial state behind. Callers decide what
//! a failure means; the store layer treats them as silent no-ops.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A referenced node, edge, or group does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The entities exist but the requested mutation is not allowed.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl GraphError {
    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        GraphError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidOperation(message.into())
    }
}
