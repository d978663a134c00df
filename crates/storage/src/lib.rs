//! Storage backends for otiflow data.

mod json_storage;
mod memory;
mod trait_;

pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
pub use trait_::{Result, Storage, StorageError};
