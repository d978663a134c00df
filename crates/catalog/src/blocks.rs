//! Building block catalog service.

use std::sync::Arc;

use async_trait::async_trait;
use otiflow_core::{
    Archivable, BlockCategory, BlockId, BuildingBlock, Error, Result,
};
use otiflow_storage::Storage;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Specification for creating a building block.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub name: String,
    pub category: BlockCategory,
    pub description: String,
    pub responsible_team: String,
    pub estimated_days: u32,
    pub icon: String,
    pub color: String,
    pub sla_warning_days: Option<u32>,
    pub required: bool,
    pub can_run_in_parallel: bool,
    pub checklist_items: Vec<String>,
    pub outputs: Vec<String>,
}

impl NewBlock {
    /// Minimal spec; remaining fields start empty/default.
    pub fn new(
        name: impl Into<String>,
        category: BlockCategory,
        responsible_team: impl Into<String>,
        estimated_days: u32,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            description: String::new(),
            responsible_team: responsible_team.into(),
            estimated_days,
            icon: String::new(),
            color: String::new(),
            sla_warning_days: None,
            required: true,
            can_run_in_parallel: false,
            checklist_items: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Partial update for a building block. `None` fields are left untouched.
/// The id is never part of a patch.
#[derive(Debug, Clone, Default)]
pub struct BlockPatch {
    pub name: Option<String>,
    pub category: Option<BlockCategory>,
    pub description: Option<String>,
    pub responsible_team: Option<String>,
    pub estimated_days: Option<u32>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sla_warning_days: Option<u32>,
    pub required: Option<bool>,
    pub can_run_in_parallel: Option<bool>,
    pub checklist_items: Option<Vec<String>>,
    pub outputs: Option<Vec<String>>,
}

/// Receipt returned by `archive`.
///
/// `in_use` tells the caller the block is still referenced somewhere;
/// archiving is allowed regardless, since references are by id and tolerate
/// it, but the caller should surface the warning.
#[derive(Debug, Clone)]
pub struct ArchiveReceipt {
    /// The block after archiving.
    pub block: BuildingBlock,
    /// Whether templates still reference this block.
    pub in_use: bool,
}

/// Building block catalog operations.
#[async_trait]
pub trait BlockCatalog: Send + Sync {
    /// Create a block; assigns a fresh id, zero usage, active.
    async fn create(&self, spec: NewBlock) -> Result<BuildingBlock>;

    /// Merge a patch into an existing block.
    async fn update(&self, id: BlockId, patch: BlockPatch) -> Result<BuildingBlock>;

    /// Soft-archive a block; existing references stay valid.
    async fn archive(&self, id: BlockId) -> Result<ArchiveReceipt>;

    /// Fetch a block by id, archived or not.
    async fn get(&self, id: BlockId) -> Result<Option<BuildingBlock>>;

    /// List active blocks, optionally filtered by category.
    async fn list_active(&self, category: Option<BlockCategory>) -> Result<Vec<BuildingBlock>>;
}

/// Storage-backed catalog implementation.
pub struct BasicBlockCatalog<S: Storage> {
    storage: Arc<Mutex<S>>,
}

impl<S: Storage> BasicBlockCatalog<S> {
    /// Create a catalog over shared storage.
    pub fn new(storage: Arc<Mutex<S>>) -> Self {
        Self { storage }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("a block name is required"));
    }
    Ok(())
}

fn validate_team(team: &str) -> Result<()> {
    if team.trim().is_empty() {
        return Err(Error::validation("a responsible team is required"));
    }
    Ok(())
}

fn validate_estimate(days: u32) -> Result<()> {
    if days == 0 || days > BuildingBlock::MAX_ESTIMATED_DAYS {
        return Err(Error::validation(format!(
            "estimated days must be between 1 and {}",
            BuildingBlock::MAX_ESTIMATED_DAYS
        )));
    }
    Ok(())
}

#[async_trait]
impl<S: Storage + 'static> BlockCatalog for BasicBlockCatalog<S> {
    async fn create(&self, spec: NewBlock) -> Result<BuildingBlock> {
        validate_name(&spec.name)?;
        validate_team(&spec.responsible_team)?;
        validate_estimate(spec.estimated_days)?;

        let now = chrono::Utc::now();
        let block = BuildingBlock {
            id: BlockId::new(),
            name: spec.name,
            category: spec.category,
            description: spec.description,
            responsible_team: spec.responsible_team,
            estimated_days: spec.estimated_days,
            icon: spec.icon,
            color: spec.color,
            sla_warning_days: spec.sla_warning_days,
            required: spec.required,
            can_run_in_parallel: spec.can_run_in_parallel,
            checklist_items: spec.checklist_items,
            outputs: spec.outputs,
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut storage = self.storage.lock().await;
        let mut blocks = storage.load_blocks().await?;
        blocks.push(block.clone());
        storage.save_blocks(&blocks).await?;

        info!(id = %block.id, name = %block.name, "building block created");
        Ok(block)
    }

    async fn update(&self, id: BlockId, patch: BlockPatch) -> Result<BuildingBlock> {
        if let Some(days) = patch.estimated_days {
            validate_estimate(days)?;
        }
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(team) = &patch.responsible_team {
            validate_team(team)?;
        }

        let mut storage = self.storage.lock().await;
        let mut blocks = storage.load_blocks().await?;
        let block = blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| Error::not_found(format!("building block {id}")))?;

        if let Some(name) = patch.name {
            block.name = name;
        }
        if let Some(category) = patch.category {
            block.category = category;
        }
        if let Some(description) = patch.description {
            block.description = description;
        }
        if let Some(team) = patch.responsible_team {
            block.responsible_team = team;
        }
        if let Some(days) = patch.estimated_days {
            block.estimated_days = days;
        }
        if let Some(icon) = patch.icon {
            block.icon = icon;
        }
        if let Some(color) = patch.color {
            block.color = color;
        }
        if let Some(days) = patch.sla_warning_days {
            block.sla_warning_days = Some(days);
        }
        if let Some(required) = patch.required {
            block.required = required;
        }
        if let Some(parallel) = patch.can_run_in_parallel {
            block.can_run_in_parallel = parallel;
        }
        if let Some(items) = patch.checklist_items {
            block.checklist_items = items;
        }
        if let Some(outputs) = patch.outputs {
            block.outputs = outputs;
        }
        block.updated_at = chrono::Utc::now();

        let updated = block.clone();
        storage.save_blocks(&blocks).await?;
        Ok(updated)
    }

    async fn archive(&self, id: BlockId) -> Result<ArchiveReceipt> {
        let mut storage = self.storage.lock().await;
        let mut blocks = storage.load_blocks().await?;
        let block = blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| Error::not_found(format!("building block {id}")))?;

        let in_use = block.usage_count > 0;
        if in_use {
            warn!(
                id = %block.id,
                usage_count = block.usage_count,
                "archiving a block that templates still reference"
            );
        }

        block.archive();
        block.updated_at = chrono::Utc::now();

        let archived = block.clone();
        storage.save_blocks(&blocks).await?;
        Ok(ArchiveReceipt {
            block: archived,
            in_use,
        })
    }

    async fn get(&self, id: BlockId) -> Result<Option<BuildingBlock>> {
        let storage = self.storage.lock().await;
        let blocks = storage.load_blocks().await?;
        Ok(blocks.into_iter().find(|b| b.id == id))
    }

    async fn list_active(&self, category: Option<BlockCategory>) -> Result<Vec<BuildingBlock>> {
        let storage = self.storage.lock().await;
        let blocks = storage.load_blocks().await?;
        Ok(blocks
            .into_iter()
            .filter(|b| b.is_active)
            .filter(|b| category.map_or(true, |c| b.category == c))
            .collect())
    }
}
