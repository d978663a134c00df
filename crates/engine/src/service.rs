//! Workflow service - wires the state machine to storage and the owning OTI.
//!
//! Each operation loads the full OTI collection, applies one in-memory
//! mutation, and saves the collection back before returning; the caller
//! awaits the save, so a transition is never half-applied from the caller's
//! perspective. Recomputation is idempotent, so a rejected save can be
//! retried without re-running business logic.

use std::sync::Arc;

use otiflow_catalog::BlockIndex;
use otiflow_core::{Error, Oti, OtiId, OtiStatus, Result, TemplateId};
use otiflow_storage::Storage;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::advance::{advance, AdvanceRequest};
use crate::instantiate::build_instance;

/// Storage-backed workflow operations for OTIs.
pub struct WorkflowService<S: Storage> {
    storage: Arc<Mutex<S>>,
}

impl<S: Storage + 'static> WorkflowService<S> {
    /// Create a service over shared storage.
    pub fn new(storage: Arc<Mutex<S>>) -> Self {
        Self { storage }
    }

    /// Instantiate a template as the OTI's workflow.
    ///
    /// Each OTI owns at most one workflow instance. Once one exists, a
    /// second instantiation is rejected so accumulated block state cannot
    /// be wiped by accident; `force` is the explicit replace path and
    /// discards the existing instance. Archived templates cannot be
    /// instantiated; workflows already created from them continue
    /// independently. Unresolvable block references are logged and
    /// degraded, never fatal.
    pub async fn instantiate(
        &self,
        oti_id: OtiId,
        template_id: TemplateId,
        force: bool,
    ) -> Result<Oti> {
        let mut storage = self.storage.lock().await;

        let mut otis = storage.load_otis().await?;
        let position = otis
            .iter()
            .position(|o| o.id == oti_id)
            .ok_or_else(|| Error::not_found(format!("OTI {oti_id}")))?;
        if otis[position].workflow.is_some() && !force {
            return Err(Error::validation(format!(
                "OTI {oti_id} already has a workflow; pass force to replace it"
            )));
        }

        let mut templates = storage.load_templates().await?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == template_id && t.is_active)
            .ok_or_else(|| Error::not_found(format!("template {template_id}")))?;

        let index = BlockIndex::new(storage.load_blocks().await?);
        let (instance, warnings) = build_instance(template, &index);
        for w in &warnings {
            warn!(block_id = %w.block_id, "workflow degraded: {w}");
        }

        template.usage_count += 1;

        let oti = &mut otis[position];
        oti.workflow = Some(instance);
        oti.progress_percentage = 0;
        oti.updated_at = chrono::Utc::now();

        let result = oti.clone();
        storage.save_templates(&templates).await?;
        storage.save_otis(&otis).await?;

        info!(oti = %oti_id, template = %template_id, "workflow instantiated");
        Ok(result)
    }

    /// Apply one block transition to the OTI's workflow.
    ///
    /// When the transition completes the final block, the OTI itself is
    /// promoted: status becomes done and the actual completion date is set.
    pub async fn advance(&self, oti_id: OtiId, req: AdvanceRequest) -> Result<Oti> {
        let sequence = req.sequence;
        let mut storage = self.storage.lock().await;
        let mut otis = storage.load_otis().await?;
        let oti = otis
            .iter_mut()
            .find(|o| o.id == oti_id)
            .ok_or_else(|| Error::not_found(format!("OTI {oti_id}")))?;

        let workflow = oti
            .workflow
            .as_mut()
            .ok_or_else(|| Error::validation(format!("OTI {oti_id} has no workflow")))?;

        let now = chrono::Utc::now();
        let outcome = advance(workflow, req, now)?;

        oti.progress_percentage = workflow.overall_progress;
        if outcome.workflow_complete {
            oti.status = OtiStatus::Done;
            oti.actual_completion_date = Some(now);
            info!(oti = %oti_id, "workflow complete, OTI promoted to done");
        }
        oti.updated_at = now;

        let result = oti.clone();
        storage.save_otis(&otis).await?;

        info!(oti = %oti_id, block = sequence, "block transition applied");
        Ok(result)
    }

    /// Toggle a checklist item on one of the workflow's blocks.
    pub async fn set_checklist_item(
        &self,
        oti_id: OtiId,
        sequence: u32,
        item: usize,
        done: bool,
    ) -> Result<Oti> {
        let mut storage = self.storage.lock().await;
        let mut otis = storage.load_otis().await?;
        let oti = otis
            .iter_mut()
            .find(|o| o.id == oti_id)
            .ok_or_else(|| Error::not_found(format!("OTI {oti_id}")))?;

        let workflow = oti
            .workflow
            .as_mut()
            .ok_or_else(|| Error::validation(format!("OTI {oti_id} has no workflow")))?;

        crate::advance::set_checklist_item(workflow, sequence, item, done)?;
        oti.updated_at = chrono::Utc::now();

        let result = oti.clone();
        storage.save_otis(&otis).await?;
        Ok(result)
    }
}
