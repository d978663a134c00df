//! Workflow template model - ordered compositions of block references.

use serde::{Deserialize, Serialize};

use crate::archive::Archivable;
use crate::id::{BlockId, TemplateId};
use crate::Time;

/// An ordered, reusable composition of building-block references.
///
/// Templates reference blocks by id, never own them. `estimated_total_days`
/// is derived from the catalog at save time and recomputed whenever the
/// block list changes; per-OTI instances snapshot their own copies instead
/// (see `BlockInstance`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    /// Unique identifier
    pub id: TemplateId,

    /// Template name
    pub name: String,

    /// Detailed description
    pub description: String,

    /// Free-form grouping label
    pub category: String,

    /// Ordered block references; sequences are contiguous from 1
    pub blocks: Vec<TemplateBlockRef>,

    /// Derived: sum of per-block durations at last save
    pub estimated_total_days: u32,

    /// How many workflows have been instantiated from this template
    pub usage_count: u32,

    /// Soft-delete flag; archived templates cannot be instantiated
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl Archivable for WorkflowTemplate {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

/// One entry in a template: a block reference plus per-reference overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateBlockRef {
    /// Referenced building block
    pub block_id: BlockId,

    /// 1-based position within the template
    pub sequence: u32,

    /// Override of the referenced block's estimated days
    pub custom_duration: Option<u32>,

    /// Free-form notes for this use of the block
    pub notes: Option<String>,
}

impl TemplateBlockRef {
    /// Reference a block with no overrides; sequence is assigned on save.
    pub fn new(block_id: BlockId) -> Self {
        Self {
            block_id,
            sequence: 0,
            custom_duration: None,
            notes: None,
        }
    }
}

/// Rewrite sequence numbers to a contiguous 1..=N run, keeping the order
/// the references were given in.
pub fn normalize_sequences(refs: &mut [TemplateBlockRef]) {
    for (idx, r) in refs.iter_mut().enumerate() {
        r.sequence = idx as u32 + 1;
    }
}
