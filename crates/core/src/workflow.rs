//! Workflow instance model - the live, per-OTI execution state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{BlockId, TemplateId};
use crate::Time;

/// The concrete, per-OTI instantiation of a template.
///
/// Owned exclusively by its OTI: created once at instantiation, mutated in
/// place by the execution engine, never shared. The template may later be
/// edited or archived without invalidating the instance, because every
/// per-block estimate and checklist size was snapshotted at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Template this instance was created from (reference, not ownership)
    pub template_id: TemplateId,

    /// State-tracked block instances, ordered by sequence
    pub blocks: Vec<BlockInstance>,

    /// Derived: rounded completion percentage, 0-100
    pub overall_progress: u8,

    /// Derived: sequence of the currently actionable block, if any
    pub current_block: Option<u32>,

    /// Derived: number of completed blocks
    pub blocks_completed: usize,

    /// Total block count, fixed at instantiation time
    pub blocks_total: usize,
}

impl WorkflowInstance {
    /// Find a block instance by sequence number.
    pub fn block(&self, sequence: u32) -> Option<&BlockInstance> {
        self.blocks.iter().find(|b| b.sequence == sequence)
    }

    /// Mutable lookup by sequence number.
    pub fn block_mut(&mut self, sequence: u32) -> Option<&mut BlockInstance> {
        self.blocks.iter_mut().find(|b| b.sequence == sequence)
    }

    /// Whether every block has been completed.
    pub fn is_complete(&self) -> bool {
        self.blocks_total > 0 && self.blocks_completed == self.blocks_total
    }
}

/// One state-tracked execution of a building block within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInstance {
    /// Referenced building block
    pub block_id: BlockId,

    /// 1-based position, copied from the template at instantiation and
    /// immutable thereafter even if the template changes
    pub sequence: u32,

    /// Who is carrying out this step
    pub assigned_to: Option<String>,

    /// Current lifecycle state
    pub status: BlockStatus,

    /// When work started (set once, on first transition to in-progress)
    pub start_date: Option<Time>,

    /// When the block was completed
    pub completed_date: Option<Time>,

    /// Derived on completion: business days between start and completion
    pub actual_days: Option<u32>,

    /// Working notes
    pub notes: String,

    /// Notes recorded at completion
    pub completion_notes: String,

    /// Estimate snapshotted at instantiation, immune to later catalog edits
    pub estimated_days: u32,

    /// Checklist state against the snapshotted item count
    pub checklist: ChecklistProgress,
}

/// Checklist completion state for a block instance.
///
/// `total` is snapshotted from the catalog block at instantiation time;
/// `completed` holds indices into that frozen item list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    /// Indices of completed items
    pub completed: BTreeSet<usize>,

    /// Item count at instantiation time
    pub total: usize,
}

impl ChecklistProgress {
    /// Create an empty checklist of the given size.
    pub fn with_total(total: usize) -> Self {
        Self {
            completed: BTreeSet::new(),
            total,
        }
    }

    /// Number of completed items.
    pub fn done(&self) -> usize {
        self.completed.len()
    }
}

/// Lifecycle state of a block instance.
///
/// Sequential execution is encoded in the states themselves: a block sits in
/// `Waiting` until its predecessor completes, which flips it to
/// `NotStarted` - the only mechanism by which later blocks become workable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockStatus {
    /// Blocked behind an earlier, uncompleted block
    Waiting,
    /// Actionable but not yet begun
    NotStarted,
    /// Work underway
    InProgress,
    /// Done
    Completed,
}

impl BlockStatus {
    /// The kebab-case name used in stored JSON and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "not-started" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown block status: {other}")),
        }
    }
}
