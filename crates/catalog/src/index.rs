//! By-id index over a block collection.

use std::collections::HashMap;

use otiflow_core::{BlockId, BuildingBlock};

/// An indexed view over a block collection for by-id lookups.
///
/// Includes archived blocks: templates and workflow instances reference
/// blocks by id and must keep resolving them after archival.
#[derive(Debug, Default)]
pub struct BlockIndex {
    by_id: HashMap<BlockId, BuildingBlock>,
}

impl BlockIndex {
    /// Build an index from a loaded collection.
    pub fn new(blocks: Vec<BuildingBlock>) -> Self {
        Self {
            by_id: blocks.into_iter().map(|b| (b.id, b)).collect(),
        }
    }

    /// Look up a block by id.
    pub fn get(&self, id: BlockId) -> Option<&BuildingBlock> {
        self.by_id.get(&id)
    }

    /// Whether the id resolves at all (active or archived).
    pub fn contains(&self, id: BlockId) -> bool {
        self.by_id.contains_key(&id)
    }
}
