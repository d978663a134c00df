//! Storage trait abstraction.

use async_trait::async_trait;
use otiflow_core::{BuildingBlock, Oti, WorkflowTemplate};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<StorageError> for otiflow_core::Error {
    fn from(e: StorageError) -> Self {
        otiflow_core::Error::Storage(e.to_string())
    }
}

/// Whole-collection persistence for otiflow data.
///
/// Every collection is read and replaced as a unit; there are no row-level
/// writes. Callers construct the full updated collection before saving, and
/// backends must keep a recoverable copy of at least one prior version
/// before overwriting.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Building block catalog ===

    /// Load the full block collection. An absent collection is empty.
    async fn load_blocks(&self) -> Result<Vec<BuildingBlock>>;

    /// Replace the full block collection.
    async fn save_blocks(&mut self, blocks: &[BuildingBlock]) -> Result<()>;

    // === Workflow templates ===

    /// Load the full template collection.
    async fn load_templates(&self) -> Result<Vec<WorkflowTemplate>>;

    /// Replace the full template collection.
    async fn save_templates(&mut self, templates: &[WorkflowTemplate]) -> Result<()>;

    // === OTIs (each carrying its optional workflow instance) ===

    /// Load the full OTI collection.
    async fn load_otis(&self) -> Result<Vec<Oti>>;

    /// Replace the full OTI collection.
    async fn save_otis(&mut self, otis: &[Oti]) -> Result<()>;
}
