//! OTI status/progress aggregation.
//!
//! Pure, read-only projections over an OTI: no caching, re-evaluated on
//! every read. When a workflow exists its derived counts are authoritative;
//! otherwise the manually-set percentage is used.

use otiflow_core::{Oti, OtiStatus, Time};

/// The OTI's completion percentage, 0-100.
pub fn progress_of(oti: &Oti) -> u8 {
    match &oti.workflow {
        Some(wf) if wf.blocks_total > 0 => {
            (100.0 * wf.blocks_completed as f64 / wf.blocks_total as f64).round() as u8
        }
        Some(_) => 0,
        None => oti.progress_percentage.min(100),
    }
}

/// Whether the OTI has blown past its target date without being done.
pub fn is_overdue(oti: &Oti, now: Time) -> bool {
    match oti.target_completion_date {
        Some(target) => now > target && oti.status != OtiStatus::Done,
        None => false,
    }
}
