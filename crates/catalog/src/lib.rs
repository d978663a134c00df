//! Building block catalog and workflow template store.

mod blocks;
mod index;
mod templates;

pub use blocks::{ArchiveReceipt, BasicBlockCatalog, BlockCatalog, BlockPatch, NewBlock};
pub use index::BlockIndex;
pub use templates::{
    estimate_total_days, BasicTemplateStore, Estimate, NewTemplate, TemplatePatch, TemplateStore,
};
