//! Building block model - reusable step definitions in the catalog.

use serde::{Deserialize, Serialize};

use crate::archive::Archivable;
use crate::id::BlockId;
use crate::Time;

/// A building block is a reusable unit of work: one catalog-defined step
/// that templates reference by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingBlock {
    /// Unique identifier, immutable once created
    pub id: BlockId,

    /// Block name
    pub name: String,

    /// Pipeline category
    pub category: BlockCategory,

    /// Detailed description
    pub description: String,

    /// Team responsible for carrying out this step
    pub responsible_team: String,

    /// Estimated duration in business days (always > 0)
    pub estimated_days: u32,

    /// Icon name for display layers
    pub icon: String,

    /// Accent color for display layers
    pub color: String,

    /// Days before the estimate at which an SLA warning should fire
    pub sla_warning_days: Option<u32>,

    /// Whether the step is mandatory in any template using it
    pub required: bool,

    /// Whether the step may run alongside its neighbours
    pub can_run_in_parallel: bool,

    /// Ordered checklist items completed during execution
    pub checklist_items: Vec<String>,

    /// Ordered outputs this step produces
    pub outputs: Vec<String>,

    /// How many templates reference this block
    pub usage_count: u32,

    /// Soft-delete flag; archived blocks stay resolvable by id
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl BuildingBlock {
    /// Upper bound on a single block's estimate, in business days.
    pub const MAX_ESTIMATED_DAYS: u32 = 90;
}

impl Archivable for BuildingBlock {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

/// Pipeline categories a building block can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockCategory {
    /// Initial request capture and triage
    Intake,
    /// Feasibility and impact assessment
    Assessment,
    /// Purchasing and contracting
    Procurement,
    /// Security and compliance review
    Security,
    /// Build and configuration work
    Implementation,
    /// Verification and acceptance testing
    Testing,
    /// Rollout to the live estate
    Deployment,
    /// Post-completion review and sign-off
    Review,
}

impl BlockCategory {
    /// The kebab-case name used in stored JSON and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Assessment => "assessment",
            Self::Procurement => "procurement",
            Self::Security => "security",
            Self::Implementation => "implementation",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::Review => "review",
        }
    }
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlockCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intake" => Ok(Self::Intake),
            "assessment" => Ok(Self::Assessment),
            "procurement" => Ok(Self::Procurement),
            "security" => Ok(Self::Security),
            "implementation" => Ok(Self::Implementation),
            "testing" => Ok(Self::Testing),
            "deployment" => Ok(Self::Deployment),
            "review" => Ok(Self::Review),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&BlockCategory::Security).unwrap();
        assert_eq!(json, "\"security\"");
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in [
            BlockCategory::Intake,
            BlockCategory::Assessment,
            BlockCategory::Procurement,
            BlockCategory::Security,
            BlockCategory::Implementation,
            BlockCategory::Testing,
            BlockCategory::Deployment,
            BlockCategory::Review,
        ] {
            assert_eq!(c.as_str().parse::<BlockCategory>().unwrap(), c);
        }
    }
}
