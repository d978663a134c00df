//! OTI model - the top-level tracked work item.
//!
//! Most of an OTI's lifecycle is driven by display and intake layers; the
//! workflow fields (`workflow`, `status`, `progress_percentage`,
//! `actual_completion_date`) are rewritten by the execution engine as a side
//! effect of block-state transitions.

use serde::{Deserialize, Serialize};

use crate::id::OtiId;
use crate::workflow::WorkflowInstance;
use crate::Time;

/// An Operational Technology Initiative moving through the
/// intake-to-completion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oti {
    /// Unique identifier
    pub id: OtiId,

    /// Initiative title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Council reference code, free-form
    pub reference: String,

    /// Delivery priority
    pub priority: OtiPriority,

    /// Pipeline status; the engine only ever writes `Done`
    pub status: OtiStatus,

    /// Manually-set progress, used when no workflow exists;
    /// mirrored from the workflow otherwise
    pub progress_percentage: u8,

    /// Agreed completion target
    pub target_completion_date: Option<Time>,

    /// Set by the engine when the workflow completes
    pub actual_completion_date: Option<Time>,

    /// The per-OTI workflow instance, if one has been started
    pub workflow: Option<WorkflowInstance>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl Oti {
    /// Create a fresh OTI at the start of the pipeline.
    pub fn new(title: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: OtiId::new(),
            title: title.into(),
            description: String::new(),
            reference: String::new(),
            priority: OtiPriority::Medium,
            status: OtiStatus::Intake,
            progress_percentage: 0,
            target_completion_date: None,
            actual_completion_date: None,
            workflow: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pipeline status of an OTI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtiStatus {
    /// Captured, awaiting triage
    Intake,
    /// Under feasibility assessment
    Assessment,
    /// Being delivered
    InProgress,
    /// Paused
    OnHold,
    /// Delivered
    Done,
}

impl OtiStatus {
    /// The kebab-case name used in stored JSON and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Assessment => "assessment",
            Self::InProgress => "in-progress",
            Self::OnHold => "on-hold",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for OtiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OtiStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intake" => Ok(Self::Intake),
            "assessment" => Ok(Self::Assessment),
            "in-progress" => Ok(Self::InProgress),
            "on-hold" => Ok(Self::OnHold),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown OTI status: {other}")),
        }
    }
}

/// Delivery priority of an OTI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtiPriority {
    /// Routine work
    Low,
    /// Default
    Medium,
    /// Needed soon
    High,
    /// Service-affecting
    Critical,
}

impl std::fmt::Display for OtiPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OtiPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}
