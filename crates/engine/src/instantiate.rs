//! Workflow instantiation - template to per-OTI instance.

use otiflow_catalog::BlockIndex;
use otiflow_core::{
    BlockInstance, BlockStatus, ChecklistProgress, ReferentialWarning, WorkflowInstance,
    WorkflowTemplate,
};

/// Build a workflow instance from a template.
///
/// One block instance is produced per template reference, in ascending
/// sequence order. Only the first block starts actionable (`not-started`);
/// everything after it waits - strictly sequential execution. Per-block
/// estimates and checklist sizes are snapshotted here and never touched by
/// later catalog or template edits.
///
/// An unresolvable block reference degrades to a zero estimate and an empty
/// checklist rather than aborting the instantiation; each degradation is
/// reported as a warning.
pub fn build_instance(
    template: &WorkflowTemplate,
    index: &BlockIndex,
) -> (WorkflowInstance, Vec<ReferentialWarning>) {
    let mut refs: Vec<_> = template.blocks.iter().collect();
    refs.sort_by_key(|r| r.sequence);

    let mut warnings = Vec::new();
    let blocks: Vec<BlockInstance> = refs
        .iter()
        .map(|r| {
            let catalog_block = index.get(r.block_id);
            if catalog_block.is_none() {
                warnings.push(ReferentialWarning {
                    block_id: r.block_id,
                    context: "instantiation".to_string(),
                });
            }

            let estimated_days = r
                .custom_duration
                .or_else(|| catalog_block.map(|b| b.estimated_days))
                .unwrap_or(0);
            let checklist_total = catalog_block.map_or(0, |b| b.checklist_items.len());

            BlockInstance {
                block_id: r.block_id,
                sequence: r.sequence,
                assigned_to: None,
                status: if r.sequence == 1 {
                    BlockStatus::NotStarted
                } else {
                    BlockStatus::Waiting
                },
                start_date: None,
                completed_date: None,
                actual_days: None,
                notes: String::new(),
                completion_notes: String::new(),
                estimated_days,
                checklist: ChecklistProgress::with_total(checklist_total),
            }
        })
        .collect();

    let blocks_total = blocks.len();
    let instance = WorkflowInstance {
        template_id: template.id,
        blocks,
        overall_progress: 0,
        current_block: if blocks_total > 0 { Some(1) } else { None },
        blocks_completed: 0,
        blocks_total,
    };

    (instance, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use otiflow_core::{
        BlockCategory, BlockId, BuildingBlock, TemplateBlockRef, TemplateId,
    };

    fn catalog_block(name: &str, days: u32, checklist: usize) -> BuildingBlock {
        let now = chrono::Utc::now();
        BuildingBlock {
            id: BlockId::new(),
            name: name.to_string(),
            category: BlockCategory::Implementation,
            description: String::new(),
            responsible_team: "infra".to_string(),
            estimated_days: days,
            icon: String::new(),
            color: String::new(),
            sla_warning_days: None,
            required: true,
            can_run_in_parallel: false,
            checklist_items: (0..checklist).map(|i| format!("item {i}")).collect(),
            outputs: Vec::new(),
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn template_of(blocks: &[&BuildingBlock]) -> WorkflowTemplate {
        let now = chrono::Utc::now();
        let refs: Vec<TemplateBlockRef> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| TemplateBlockRef {
                block_id: b.id,
                sequence: i as u32 + 1,
                custom_duration: None,
                notes: None,
            })
            .collect();
        WorkflowTemplate {
            id: TemplateId::new(),
            name: "T".to_string(),
            description: String::new(),
            category: String::new(),
            blocks: refs,
            estimated_total_days: 0,
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_block_actionable_rest_waiting() {
        let a = catalog_block("A", 5, 2);
        let b = catalog_block("B", 3, 0);
        let c = catalog_block("C", 4, 1);
        let template = template_of(&[&a, &b, &c]);
        let index = BlockIndex::new(vec![a, b, c]);

        let (wf, warnings) = build_instance(&template, &index);

        assert!(warnings.is_empty());
        assert_eq!(wf.blocks_total, 3);
        assert_eq!(wf.blocks_completed, 0);
        assert_eq!(wf.overall_progress, 0);
        assert_eq!(wf.current_block, Some(1));
        assert_eq!(wf.blocks[0].status, BlockStatus::NotStarted);
        assert_eq!(wf.blocks[1].status, BlockStatus::Waiting);
        assert_eq!(wf.blocks[2].status, BlockStatus::Waiting);
    }

    #[test]
    fn snapshots_custom_duration_over_catalog_estimate() {
        let a = catalog_block("A", 5, 0);
        let mut template = template_of(&[&a]);
        template.blocks[0].custom_duration = Some(2);
        let index = BlockIndex::new(vec![a]);

        let (wf, _) = build_instance(&template, &index);
        assert_eq!(wf.blocks[0].estimated_days, 2);
    }

    #[test]
    fn snapshots_checklist_total() {
        let a = catalog_block("A", 5, 4);
        let template = template_of(&[&a]);
        let index = BlockIndex::new(vec![a]);

        let (wf, _) = build_instance(&template, &index);
        assert_eq!(wf.blocks[0].checklist.total, 4);
        assert_eq!(wf.blocks[0].checklist.done(), 0);
    }

    #[test]
    fn unresolvable_block_degrades_to_zero_with_warning() {
        let a = catalog_block("A", 5, 2);
        let template = template_of(&[&a]);
        // Empty index: nothing resolves.
        let index = BlockIndex::default();

        let (wf, warnings) = build_instance(&template, &index);
        assert_eq!(wf.blocks_total, 1);
        assert_eq!(wf.blocks[0].estimated_days, 0);
        assert_eq!(wf.blocks[0].checklist.total, 0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn out_of_order_refs_are_instantiated_in_sequence_order() {
        let a = catalog_block("A", 1, 0);
        let b = catalog_block("B", 2, 0);
        let mut template = template_of(&[&a, &b]);
        template.blocks.swap(0, 1);
        let index = BlockIndex::new(vec![a, b]);

        let (wf, _) = build_instance(&template, &index);
        let seqs: Vec<u32> = wf.blocks.iter().map(|b| b.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }
}
