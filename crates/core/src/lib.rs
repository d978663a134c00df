//! otiflow core data models.
//!
//! This crate defines the entities of the OTI workflow pipeline: the
//! building block catalog, workflow templates, per-OTI workflow instances
//! and the OTIs themselves, plus the shared error taxonomy and the
//! business-day calendar. It does no I/O.

#![warn(missing_docs)]

// Core identities
mod id;

// Shared capabilities
mod archive;
mod calendar;
mod error;

// Catalog and templates
mod block;
mod template;

// Per-OTI execution state
mod oti;
mod workflow;

// Re-exports
pub use id::{BlockId, IdParseError, OtiId, TemplateId};

pub use archive::Archivable;
pub use calendar::business_days_between;
pub use error::{Error, ReferentialWarning, Result};

pub use block::{BlockCategory, BuildingBlock};
pub use template::{normalize_sequences, TemplateBlockRef, WorkflowTemplate};

pub use oti::{Oti, OtiPriority, OtiStatus};
pub use workflow::{BlockInstance, BlockStatus, ChecklistProgress, WorkflowInstance};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
