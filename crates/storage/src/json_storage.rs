//! JSON file storage implementation.
//!
//! Stores each collection as one JSON document under the data directory
//! (`blocks.json`, `templates.json`, `otis.json`). Before a collection is
//! overwritten, the previous document is copied to a `.bak` sibling so one
//! prior version is always recoverable.

use std::path::{Path, PathBuf};

use otiflow_core::{BuildingBlock, Oti, WorkflowTemplate};
use tokio::fs;
use tracing::debug;

use super::{Result, Storage};

const BLOCKS: &str = "blocks";
const TEMPLATES: &str = "templates";
const OTIS: &str = "otis";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at the given directory, creating it if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    fn backup_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json.bak"))
    }

    async fn read_collection<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        match fs::read_to_string(self.collection_path(name)).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_collection<T: serde::Serialize>(&self, name: &str, items: &[T]) -> Result<()> {
        let path = self.collection_path(name);

        // Keep the previous version recoverable before overwriting.
        match fs::copy(&path, self.backup_path(name)).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let json = serde_json::to_string_pretty(items)?;
        fs::write(&path, json.as_bytes()).await?;
        debug!(collection = name, count = items.len(), "collection saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load_blocks(&self) -> Result<Vec<BuildingBlock>> {
        self.read_collection(BLOCKS).await
    }

    async fn save_blocks(&mut self, blocks: &[BuildingBlock]) -> Result<()> {
        self.write_collection(BLOCKS, blocks).await
    }

    async fn load_templates(&self) -> Result<Vec<WorkflowTemplate>> {
        self.read_collection(TEMPLATES).await
    }

    async fn save_templates(&mut self, templates: &[WorkflowTemplate]) -> Result<()> {
        self.write_collection(TEMPLATES, templates).await
    }

    async fn load_otis(&self) -> Result<Vec<Oti>> {
        self.read_collection(OTIS).await
    }

    async fn save_otis(&mut self, otis: &[Oti]) -> Result<()> {
        self.write_collection(OTIS, otis).await
    }
}
