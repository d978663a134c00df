//! Workflow instantiation, execution and aggregation.
//!
//! The state machine itself (`advance`, `build_instance`, the aggregator)
//! is pure synchronous code; `WorkflowService` wires it to storage and to
//! the owning OTI.

mod advance;
mod aggregate;
mod instantiate;
mod service;

pub use advance::{advance, refresh_derived, set_checklist_item, AdvanceOutcome, AdvanceRequest};
pub use aggregate::{is_overdue, progress_of};
pub use instantiate::build_instance;
pub use service::WorkflowService;
