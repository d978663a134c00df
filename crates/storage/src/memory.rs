//! In-memory storage backend.
//!
//! Backs service tests and throwaway tooling; keeps the same
//! whole-collection semantics as the file backend, minus durability.

use otiflow_core::{BuildingBlock, Oti, WorkflowTemplate};

use super::{Result, Storage};

/// Volatile storage holding every collection in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blocks: Vec<BuildingBlock>,
    templates: Vec<WorkflowTemplate>,
    otis: Vec<Oti>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn load_blocks(&self) -> Result<Vec<BuildingBlock>> {
        Ok(self.blocks.clone())
    }

    async fn save_blocks(&mut self, blocks: &[BuildingBlock]) -> Result<()> {
        self.blocks = blocks.to_vec();
        Ok(())
    }

    async fn load_templates(&self) -> Result<Vec<WorkflowTemplate>> {
        Ok(self.templates.clone())
    }

    async fn save_templates(&mut self, templates: &[WorkflowTemplate]) -> Result<()> {
        self.templates = templates.to_vec();
        Ok(())
    }

    async fn load_otis(&self) -> Result<Vec<Oti>> {
        Ok(self.otis.clone())
    }

    async fn save_otis(&mut self, otis: &[Oti]) -> Result<()> {
        self.otis = otis.to_vec();
        Ok(())
    }
}
