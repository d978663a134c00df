//! Workflow template store.

use std::sync::Arc;

use async_trait::async_trait;
use otiflow_core::{
    normalize_sequences, Archivable, Error, ReferentialWarning, Result, TemplateBlockRef,
    TemplateId, WorkflowTemplate,
};
use otiflow_storage::Storage;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::index::BlockIndex;

/// Result of estimating a block list against the catalog.
///
/// A missing block always earns a warning, even when its duration override
/// hides the failed lookup; without an override it contributes 0 days. It is
/// never silently dropped from the list being estimated.
#[derive(Debug, Clone)]
pub struct Estimate {
    /// Sum of per-reference durations.
    pub total_days: u32,
    /// References that failed to resolve.
    pub warnings: Vec<ReferentialWarning>,
}

/// Sum (customDuration else catalog estimate) across the references.
///
/// Pure; used at save time and by preview surfaces. Unlike the per-instance
/// snapshot, this value is recomputed on every save from live catalog data.
pub fn estimate_total_days(refs: &[TemplateBlockRef], index: &BlockIndex) -> Estimate {
    let mut total = 0u32;
    let mut warnings = Vec::new();

    for r in refs {
        let catalog_days = index.get(r.block_id).map(|b| b.estimated_days);
        if catalog_days.is_none() {
            warnings.push(ReferentialWarning {
                block_id: r.block_id,
                context: "estimate".to_string(),
            });
        }
        total += r.custom_duration.or(catalog_days).unwrap_or(0);
    }

    Estimate {
        total_days: total,
        warnings,
    }
}

/// Specification for creating a template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub category: String,
    pub blocks: Vec<TemplateBlockRef>,
}

impl NewTemplate {
    /// Minimal spec.
    pub fn new(name: impl Into<String>, blocks: Vec<TemplateBlockRef>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: String::new(),
            blocks,
        }
    }
}

/// Partial update for a template. A `blocks` replacement triggers sequence
/// normalization and an estimate recompute; `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub blocks: Option<Vec<TemplateBlockRef>>,
}

/// Workflow template store operations.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Create a template from a block list.
    async fn create(&self, spec: NewTemplate) -> Result<WorkflowTemplate>;

    /// Merge a patch; a new block list replaces the old one wholesale.
    async fn update(&self, id: TemplateId, patch: TemplatePatch) -> Result<WorkflowTemplate>;

    /// Soft-archive; already-instantiated workflows are unaffected.
    async fn archive(&self, id: TemplateId) -> Result<WorkflowTemplate>;

    /// Fetch a template by id, archived or not.
    async fn get(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>>;

    /// List active templates.
    async fn list_active(&self) -> Result<Vec<WorkflowTemplate>>;

    /// Estimate a block list against the current catalog.
    async fn estimate(&self, refs: &[TemplateBlockRef]) -> Result<Estimate>;
}

/// Storage-backed template store implementation.
pub struct BasicTemplateStore<S: Storage> {
    storage: Arc<Mutex<S>>,
}

impl<S: Storage> BasicTemplateStore<S> {
    /// Create a store over shared storage.
    pub fn new(storage: Arc<Mutex<S>>) -> Self {
        Self { storage }
    }
}

fn validate_template(name: &str, blocks: &[TemplateBlockRef], index: &BlockIndex) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("a template name is required"));
    }
    if blocks.is_empty() {
        return Err(Error::validation(
            "at least one building block is required",
        ));
    }
    for r in blocks {
        if !index.contains(r.block_id) {
            return Err(Error::validation(format!(
                "template references unknown building block {}",
                r.block_id
            )));
        }
    }
    Ok(())
}

fn log_estimate_warnings(estimate: &Estimate) {
    for w in &estimate.warnings {
        warn!(block_id = %w.block_id, "estimate degraded: {w}");
    }
}

#[async_trait]
impl<S: Storage + 'static> TemplateStore for BasicTemplateStore<S> {
    async fn create(&self, spec: NewTemplate) -> Result<WorkflowTemplate> {
        let mut storage = self.storage.lock().await;
        let mut blocks = storage.load_blocks().await?;
        let index = BlockIndex::new(blocks.clone());

        validate_template(&spec.name, &spec.blocks, &index)?;

        // New compositions draw from the active catalog only; templates
        // that already hold a reference keep it through archival.
        for r in &spec.blocks {
            if let Some(block) = index.get(r.block_id) {
                if !block.is_active {
                    return Err(Error::validation(format!(
                        "building block {} is archived and cannot join a new template",
                        r.block_id
                    )));
                }
            }
        }

        let mut refs = spec.blocks;
        normalize_sequences(&mut refs);

        let estimate = estimate_total_days(&refs, &index);
        log_estimate_warnings(&estimate);

        let now = chrono::Utc::now();
        let template = WorkflowTemplate {
            id: TemplateId::new(),
            name: spec.name,
            description: spec.description,
            category: spec.category,
            blocks: refs,
            estimated_total_days: estimate.total_days,
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        // Each referenced block picks up a usage reference.
        for r in &template.blocks {
            if let Some(block) = blocks.iter_mut().find(|b| b.id == r.block_id) {
                block.usage_count += 1;
            }
        }
        storage.save_blocks(&blocks).await?;

        let mut templates = storage.load_templates().await?;
        templates.push(template.clone());
        storage.save_templates(&templates).await?;

        info!(id = %template.id, name = %template.name, "template created");
        Ok(template)
    }

    async fn update(&self, id: TemplateId, patch: TemplatePatch) -> Result<WorkflowTemplate> {
        let mut storage = self.storage.lock().await;
        let index = BlockIndex::new(storage.load_blocks().await?);

        let mut templates = storage.load_templates().await?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found(format!("template {id}")))?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(Error::validation("a template name is required"));
            }
            template.name = name;
        }
        if let Some(description) = patch.description {
            template.description = description;
        }
        if let Some(category) = patch.category {
            template.category = category;
        }
        if let Some(mut refs) = patch.blocks {
            validate_template(&template.name, &refs, &index)?;
            normalize_sequences(&mut refs);

            let estimate = estimate_total_days(&refs, &index);
            log_estimate_warnings(&estimate);

            template.blocks = refs;
            template.estimated_total_days = estimate.total_days;
        }
        template.updated_at = chrono::Utc::now();

        let updated = template.clone();
        storage.save_templates(&templates).await?;
        Ok(updated)
    }

    async fn archive(&self, id: TemplateId) -> Result<WorkflowTemplate> {
        let mut storage = self.storage.lock().await;
        let mut templates = storage.load_templates().await?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found(format!("template {id}")))?;

        template.archive();
        template.updated_at = chrono::Utc::now();

        let archived = template.clone();
        storage.save_templates(&templates).await?;
        Ok(archived)
    }

    async fn get(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>> {
        let storage = self.storage.lock().await;
        let templates = storage.load_templates().await?;
        Ok(templates.into_iter().find(|t| t.id == id))
    }

    async fn list_active(&self) -> Result<Vec<WorkflowTemplate>> {
        let storage = self.storage.lock().await;
        let templates = storage.load_templates().await?;
        Ok(templates.into_iter().filter(|t| t.is_active).collect())
    }

    async fn estimate(&self, refs: &[TemplateBlockRef]) -> Result<Estimate> {
        let storage = self.storage.lock().await;
        let index = BlockIndex::new(storage.load_blocks().await?);
        Ok(estimate_total_days(refs, &index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BasicBlockCatalog, BlockCatalog, NewBlock};
    use otiflow_core::{BlockCategory, BlockId, BuildingBlock};
    use otiflow_storage::MemoryStorage;

    async fn seed(
        catalog: &BasicBlockCatalog<MemoryStorage>,
        name: &str,
        days: u32,
    ) -> BuildingBlock {
        catalog
            .create(NewBlock::new(name, BlockCategory::Implementation, "infra", days))
            .await
            .unwrap()
    }

    fn services() -> (
        BasicBlockCatalog<MemoryStorage>,
        BasicTemplateStore<MemoryStorage>,
    ) {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        (
            BasicBlockCatalog::new(storage.clone()),
            BasicTemplateStore::new(storage),
        )
    }

    #[tokio::test]
    async fn create_normalizes_sequences_and_sums_estimates() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;
        let b = seed(&catalog, "B", 3).await;
        let c = seed(&catalog, "C", 4).await;

        let mut b_ref = TemplateBlockRef::new(b.id);
        b_ref.custom_duration = Some(2);

        let template = store
            .create(NewTemplate::new(
                "Standard rollout",
                vec![TemplateBlockRef::new(a.id), b_ref, TemplateBlockRef::new(c.id)],
            ))
            .await
            .unwrap();

        let seqs: Vec<u32> = template.blocks.iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        // 5 + 2 (override) + 4
        assert_eq!(template.estimated_total_days, 11);
    }

    #[tokio::test]
    async fn create_bumps_block_usage() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;

        store
            .create(NewTemplate::new("T", vec![TemplateBlockRef::new(a.id)]))
            .await
            .unwrap();

        let reloaded = catalog.get(a.id).await.unwrap().unwrap();
        assert_eq!(reloaded.usage_count, 1);
    }

    #[tokio::test]
    async fn create_rejects_empty_or_unresolvable_blocks() {
        let (_, store) = services();

        let err = store
            .create(NewTemplate::new("Empty", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = store
            .create(NewTemplate::new(
                "Dangling",
                vec![TemplateBlockRef::new(BlockId::new())],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_archived_blocks_but_update_tolerates_them() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;
        let b = seed(&catalog, "B", 3).await;
        let template = store
            .create(NewTemplate::new("T", vec![TemplateBlockRef::new(a.id)]))
            .await
            .unwrap();

        catalog.archive(a.id).await.unwrap();

        let err = store
            .create(NewTemplate::new("T2", vec![TemplateBlockRef::new(a.id)]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // An existing template may keep its archived reference across edits.
        let updated = store
            .update(
                template.id,
                TemplatePatch {
                    blocks: Some(vec![
                        TemplateBlockRef::new(a.id),
                        TemplateBlockRef::new(b.id),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.blocks.len(), 2);
        assert_eq!(updated.estimated_total_days, 8);
    }

    #[tokio::test]
    async fn update_with_blocks_recomputes_estimate() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;
        let b = seed(&catalog, "B", 3).await;

        let template = store
            .create(NewTemplate::new("T", vec![TemplateBlockRef::new(a.id)]))
            .await
            .unwrap();
        assert_eq!(template.estimated_total_days, 5);

        let updated = store
            .update(
                template.id,
                TemplatePatch {
                    blocks: Some(vec![
                        TemplateBlockRef::new(a.id),
                        TemplateBlockRef::new(b.id),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.estimated_total_days, 8);
        assert_eq!(updated.blocks.len(), 2);
    }

    #[tokio::test]
    async fn estimate_recomputes_from_live_catalog() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;
        let refs = vec![TemplateBlockRef::new(a.id)];

        assert_eq!(store.estimate(&refs).await.unwrap().total_days, 5);

        // Unlike per-instance snapshots, estimates track catalog edits.
        catalog
            .update(
                a.id,
                crate::blocks::BlockPatch {
                    estimated_days: Some(9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.estimate(&refs).await.unwrap().total_days, 9);
    }

    #[tokio::test]
    async fn estimate_degrades_missing_block_to_zero_with_warning() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;

        let refs = vec![
            TemplateBlockRef::new(a.id),
            TemplateBlockRef::new(BlockId::new()),
        ];
        let estimate = store.estimate(&refs).await.unwrap();
        assert_eq!(estimate.total_days, 5);
        assert_eq!(estimate.warnings.len(), 1);
    }

    #[tokio::test]
    async fn estimate_warns_on_missing_block_even_with_override() {
        let (_, store) = services();
        let mut dangling = TemplateBlockRef::new(BlockId::new());
        dangling.custom_duration = Some(7);

        let estimate = store.estimate(&[dangling]).await.unwrap();
        assert_eq!(estimate.total_days, 7);
        assert_eq!(estimate.warnings.len(), 1);
    }

    #[tokio::test]
    async fn archive_hides_from_active_listing() {
        let (catalog, store) = services();
        let a = seed(&catalog, "A", 5).await;
        let template = store
            .create(NewTemplate::new("T", vec![TemplateBlockRef::new(a.id)]))
            .await
            .unwrap();

        store.archive(template.id).await.unwrap();
        assert!(store.list_active().await.unwrap().is_empty());
        assert!(store.get(template.id).await.unwrap().is_some());
    }
}
