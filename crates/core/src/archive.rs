//! Soft-delete capability.
//!
//! Catalog entities are never hard-deleted: templates and workflow instances
//! reference blocks by id, and those references must stay resolvable after
//! the referenced entity leaves active circulation.

/// Soft-delete capability shared by catalog entities.
pub trait Archivable {
    /// Whether the entity is still offered for new compositions.
    fn is_active(&self) -> bool;

    /// Set the active flag.
    fn set_active(&mut self, active: bool);

    /// Retire the entity from active listings without removing it.
    fn archive(&mut self) {
        self.set_active(false);
    }
}
