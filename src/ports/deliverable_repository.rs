//! Deliverable repository port.
//!
//! At most one deliverable exists per (cycle, kind); the storage layer
//! enforces that with a uniqueness constraint.

use async_trait::async_trait;

use crate::domain::foundation::{CycleId, DeliverableId, DeliverableKind, DomainError};
use crate::domain::plan::Deliverable;

/// Repository port for deliverable persistence.
#[async_trait]
pub trait DeliverableRepository: Send + Sync {
    /// Persist a new deliverable.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure (including a uniqueness
    ///   conflict on (cycle, kind) lost to a concurrent upload)
    async fn save(&self, deliverable: &Deliverable) -> Result<(), DomainError>;

    /// Update an existing deliverable (artifact replacement).
    ///
    /// # Errors
    ///
    /// - `DeliverableNotFound` if the deliverable doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, deliverable: &Deliverable) -> Result<(), DomainError>;

    /// Find a deliverable by its ID.
    async fn find_by_id(&self, id: &DeliverableId) -> Result<Option<Deliverable>, DomainError>;

    /// Find the deliverable for a (cycle, kind) pair.
    async fn find_by_cycle_and_kind(
        &self,
        cycle_id: &CycleId,
        kind: DeliverableKind,
    ) -> Result<Option<Deliverable>, DomainError>;

    /// Delete a deliverable.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &DeliverableId) -> Result<(), DomainError>;
}
