//! Error taxonomy shared by the catalog and workflow services.

use crate::id::BlockId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by catalog and workflow operations.
///
/// `Validation` and `NotFound` are rejected before any mutation happens, so
/// a failed call never leaves partial state behind.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required input.
    #[error("{0}")]
    Validation(String),

    /// Unknown id or sequence reference.
    #[error("{0} not found")]
    NotFound(String),

    /// Persistence layer failure, wrapped at the service boundary.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl Error {
    /// Build a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a not-found error; `what` names the missing thing
    /// ("template tpl-…", "workflow block 4").
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// A reference that resolved to nothing and was degraded to a safe default
/// instead of aborting the operation.
///
/// Estimate computation and workflow instantiation keep going when a catalog
/// block is missing; the caller may log these but must not treat them as
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferentialWarning {
    /// The block id that failed to resolve.
    pub block_id: BlockId,

    /// Where the degraded lookup happened.
    pub context: String,
}

impl std::fmt::Display for ReferentialWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "building block {} could not be resolved during {}",
            self.block_id, self.context
        )
    }
}
