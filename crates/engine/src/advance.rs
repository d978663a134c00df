//! The block-state machine.
//!
//! Transitions are externally triggered: one call per user action, applied
//! synchronously against in-memory state. Completing block N is the sole
//! mechanism by which block N+1 becomes workable.

use otiflow_core::{
    business_days_between, BlockStatus, Error, Result, Time, WorkflowInstance,
};

/// A requested transition for one block, by sequence number.
#[derive(Debug, Clone)]
pub struct AdvanceRequest {
    /// 1-based sequence of the target block.
    pub sequence: u32,

    /// Status to move the block to.
    pub status: BlockStatus,

    /// Assignee to merge in before the transition.
    pub assigned_to: Option<String>,

    /// Working notes to merge in.
    pub notes: Option<String>,

    /// Completion notes to merge in.
    pub completion_notes: Option<String>,

    /// Override the sequential-execution guard: allows acting on a block
    /// that is still `waiting`. Intended for manual correction only.
    pub force: bool,
}

impl AdvanceRequest {
    /// A plain transition with no patch fields.
    pub fn new(sequence: u32, status: BlockStatus) -> Self {
        Self {
            sequence,
            status,
            assigned_to: None,
            notes: None,
            completion_notes: None,
            force: false,
        }
    }
}

/// What a transition did at the workflow level.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceOutcome {
    /// True when this transition completed the final outstanding block;
    /// the owning OTI must then be promoted to done.
    pub workflow_complete: bool,
}

/// Apply one transition to a workflow instance.
///
/// Fails with `NotFound` for an unknown sequence and with `Validation` when
/// the target block is still `waiting` and `force` is not set; both
/// rejections happen before any mutation. On success every workflow-level
/// derived field is recomputed before returning.
pub fn advance(
    wf: &mut WorkflowInstance,
    req: AdvanceRequest,
    now: Time,
) -> Result<AdvanceOutcome> {
    let idx = wf
        .blocks
        .iter()
        .position(|b| b.sequence == req.sequence)
        .ok_or_else(|| Error::not_found(format!("workflow block {}", req.sequence)))?;

    if wf.blocks[idx].status == BlockStatus::Waiting && !req.force {
        return Err(Error::validation(format!(
            "block {} is still waiting on earlier steps",
            req.sequence
        )));
    }

    let block = &mut wf.blocks[idx];

    if let Some(assignee) = req.assigned_to {
        block.assigned_to = Some(assignee);
    }
    if let Some(notes) = req.notes {
        block.notes = notes;
    }
    if let Some(notes) = req.completion_notes {
        block.completion_notes = notes;
    }
    block.status = req.status;

    // Idempotent: re-entering in-progress keeps the original start date.
    if req.status == BlockStatus::InProgress && block.start_date.is_none() {
        block.start_date = Some(now);
    }

    if req.status == BlockStatus::Completed {
        block.completed_date = Some(now);
        // A block completed without ever being started has no elapsed-days
        // record; actual_days stays unset rather than pretending 0.
        block.actual_days = block.start_date.map(|start| business_days_between(start, now));

        // Unblock the next step, and only the next step.
        if let Some(next) = wf.block_mut(req.sequence + 1) {
            if next.status == BlockStatus::Waiting {
                next.status = BlockStatus::NotStarted;
            }
        }
    }

    refresh_derived(wf);

    Ok(AdvanceOutcome {
        workflow_complete: wf.is_complete(),
    })
}

/// Recompute the workflow-level derived fields from per-block state.
///
/// Idempotent and safe to call on freshly loaded instances; an `advance`
/// followed by a reload yields identical derived values.
pub fn refresh_derived(wf: &mut WorkflowInstance) {
    wf.blocks_completed = wf
        .blocks
        .iter()
        .filter(|b| b.status == BlockStatus::Completed)
        .count();

    wf.overall_progress = if wf.blocks_total == 0 {
        0
    } else {
        (100.0 * wf.blocks_completed as f64 / wf.blocks_total as f64).round() as u8
    };

    // The in-progress block wins; otherwise the first actionable one.
    wf.current_block = wf
        .blocks
        .iter()
        .find(|b| b.status == BlockStatus::InProgress)
        .or_else(|| {
            wf.blocks
                .iter()
                .find(|b| b.status == BlockStatus::NotStarted)
        })
        .map(|b| b.sequence);
}

/// Mark a checklist item on a block done or not done.
///
/// Item indices are bounded by the count snapshotted at instantiation.
pub fn set_checklist_item(
    wf: &mut WorkflowInstance,
    sequence: u32,
    item: usize,
    done: bool,
) -> Result<()> {
    let block = wf
        .block_mut(sequence)
        .ok_or_else(|| Error::not_found(format!("workflow block {sequence}")))?;

    if item >= block.checklist.total {
        return Err(Error::validation(format!(
            "checklist item {item} is out of range (block {sequence} has {} items)",
            block.checklist.total
        )));
    }

    if done {
        block.checklist.completed.insert(item);
    } else {
        block.checklist.completed.remove(&item);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use otiflow_core::{BlockId, BlockInstance, ChecklistProgress, TemplateId};

    fn instance_of(n: u32) -> WorkflowInstance {
        let blocks: Vec<BlockInstance> = (1..=n)
            .map(|seq| BlockInstance {
                block_id: BlockId::new(),
                sequence: seq,
                assigned_to: None,
                status: if seq == 1 {
                    BlockStatus::NotStarted
                } else {
                    BlockStatus::Waiting
                },
                start_date: None,
                completed_date: None,
                actual_days: None,
                notes: String::new(),
                completion_notes: String::new(),
                estimated_days: 3,
                checklist: ChecklistProgress::with_total(2),
            })
            .collect();
        WorkflowInstance {
            template_id: TemplateId::new(),
            blocks,
            overall_progress: 0,
            current_block: Some(1),
            blocks_completed: 0,
            blocks_total: n as usize,
        }
    }

    fn now() -> Time {
        // A Monday.
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn unknown_sequence_is_not_found_with_no_mutation() {
        let mut wf = instance_of(2);
        let before = wf.clone();

        let err = advance(
            &mut wf,
            AdvanceRequest::new(9, BlockStatus::InProgress),
            now(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(wf.blocks[0].status, before.blocks[0].status);
        assert_eq!(wf.overall_progress, before.overall_progress);
    }

    #[test]
    fn waiting_block_is_guarded() {
        let mut wf = instance_of(3);

        let err = advance(
            &mut wf,
            AdvanceRequest::new(2, BlockStatus::InProgress),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(wf.blocks[1].status, BlockStatus::Waiting);

        // force is the explicit manual-correction path.
        let mut req = AdvanceRequest::new(2, BlockStatus::InProgress);
        req.force = true;
        advance(&mut wf, req, now()).unwrap();
        assert_eq!(wf.blocks[1].status, BlockStatus::InProgress);
    }

    #[test]
    fn starting_sets_start_date_once() {
        let mut wf = instance_of(1);
        let first = now();

        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::InProgress), first).unwrap();
        assert_eq!(wf.blocks[0].start_date, Some(first));

        // Re-entering in-progress must not reset the start date.
        let later = first + Duration::days(2);
        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::InProgress), later).unwrap();
        assert_eq!(wf.blocks[0].start_date, Some(first));
    }

    #[test]
    fn completing_unblocks_only_the_next_block() {
        let mut wf = instance_of(4);

        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::Completed), now()).unwrap();

        assert_eq!(wf.blocks[0].status, BlockStatus::Completed);
        assert_eq!(wf.blocks[1].status, BlockStatus::NotStarted);
        assert_eq!(wf.blocks[2].status, BlockStatus::Waiting);
        assert_eq!(wf.blocks[3].status, BlockStatus::Waiting);
    }

    #[test]
    fn completion_records_business_days() {
        let mut wf = instance_of(1);
        let start = now();
        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::InProgress), start).unwrap();

        // Monday start, completed the following Monday: 5 business days.
        let end = start + Duration::days(7);
        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::Completed), end).unwrap();

        assert_eq!(wf.blocks[0].actual_days, Some(5));
        assert_eq!(wf.blocks[0].completed_date, Some(end));
    }

    #[test]
    fn completing_without_start_leaves_actual_days_unset() {
        let mut wf = instance_of(1);
        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::Completed), now()).unwrap();
        assert_eq!(wf.blocks[0].actual_days, None);
    }

    #[test]
    fn progress_and_current_block_track_completions() {
        let mut wf = instance_of(3);

        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::Completed), now()).unwrap();
        assert_eq!(wf.blocks_completed, 1);
        assert_eq!(wf.overall_progress, 33);
        assert_eq!(wf.current_block, Some(2));

        advance(&mut wf, AdvanceRequest::new(2, BlockStatus::InProgress), now()).unwrap();
        assert_eq!(wf.current_block, Some(2));

        advance(&mut wf, AdvanceRequest::new(2, BlockStatus::Completed), now()).unwrap();
        assert_eq!(wf.overall_progress, 67);
        assert_eq!(wf.current_block, Some(3));
    }

    #[test]
    fn completing_the_last_block_closes_the_workflow() {
        let mut wf = instance_of(2);

        let outcome =
            advance(&mut wf, AdvanceRequest::new(1, BlockStatus::Completed), now()).unwrap();
        assert!(!outcome.workflow_complete);

        let outcome =
            advance(&mut wf, AdvanceRequest::new(2, BlockStatus::Completed), now()).unwrap();
        assert!(outcome.workflow_complete);
        assert_eq!(wf.blocks_completed, wf.blocks_total);
        assert_eq!(wf.overall_progress, 100);
        assert_eq!(wf.current_block, None);
    }

    #[test]
    fn patch_fields_merge_before_transition() {
        let mut wf = instance_of(1);
        let mut req = AdvanceRequest::new(1, BlockStatus::InProgress);
        req.assigned_to = Some("j.smith".to_string());
        req.notes = Some("waiting on supplier quote".to_string());

        advance(&mut wf, req, now()).unwrap();
        assert_eq!(wf.blocks[0].assigned_to.as_deref(), Some("j.smith"));
        assert_eq!(wf.blocks[0].notes, "waiting on supplier quote");
    }

    #[test]
    fn refresh_derived_is_idempotent() {
        let mut wf = instance_of(3);
        advance(&mut wf, AdvanceRequest::new(1, BlockStatus::Completed), now()).unwrap();

        let snapshot = wf.clone();
        refresh_derived(&mut wf);
        assert_eq!(wf.overall_progress, snapshot.overall_progress);
        assert_eq!(wf.current_block, snapshot.current_block);
        assert_eq!(wf.blocks_completed, snapshot.blocks_completed);
    }

    #[test]
    fn zero_block_workflow_reports_zero_progress() {
        let mut wf = instance_of(0);
        refresh_derived(&mut wf);
        assert_eq!(wf.overall_progress, 0);
        assert_eq!(wf.current_block, None);
    }

    #[test]
    fn checklist_items_toggle_within_snapshotted_bounds() {
        let mut wf = instance_of(1);

        set_checklist_item(&mut wf, 1, 0, true).unwrap();
        set_checklist_item(&mut wf, 1, 1, true).unwrap();
        assert_eq!(wf.blocks[0].checklist.done(), 2);

        set_checklist_item(&mut wf, 1, 1, false).unwrap();
        assert_eq!(wf.blocks[0].checklist.done(), 1);

        let err = set_checklist_item(&mut wf, 1, 2, true).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
