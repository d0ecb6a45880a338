//! Cycle repository port (write side).
//!
//! Defines the contract for persisting and retrieving PlanCycle
//! aggregates together with their step statuses.
//!
//! # Design
//!
//! - **Aggregate-scoped**: a cycle and its five statuses load and persist
//!   as one unit; creation is all-or-nothing
//! - **Recipient-scoped**: successor lookups run per recipient

use async_trait::async_trait;

use crate::domain::foundation::{CycleId, DomainError, RecipientId};
use crate::domain::plan::PlanCycle;

/// Repository port for PlanCycle aggregate persistence.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    /// Persist a new cycle and all of its statuses atomically.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure; no partial rows remain
    async fn create(&self, cycle: &PlanCycle) -> Result<(), DomainError>;

    /// Update an existing cycle and its statuses.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, cycle: &PlanCycle) -> Result<(), DomainError>;

    /// Persist a rollover: update the demoted cycle and insert its
    /// successor as one atomic unit.
    ///
    /// A failure leaves storage untouched, so the demoted cycle keeps
    /// the latest flag there; exactly one cycle per recipient is latest
    /// before and after.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the demoted cycle doesn't exist
    /// - `DatabaseError` on persistence failure; no partial rows remain
    async fn create_successor(
        &self,
        demoted: &PlanCycle,
        successor: &PlanCycle,
    ) -> Result<(), DomainError>;

    /// Find a cycle (with statuses) by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &CycleId) -> Result<Option<PlanCycle>, DomainError>;

    /// Find all cycles of a recipient with a cycle number above the given
    /// one, ordered ascending.
    async fn find_successors(
        &self,
        recipient_id: &RecipientId,
        above_cycle_number: u32,
    ) -> Result<Vec<PlanCycle>, DomainError>;

    /// Find the highest-numbered cycle of a recipient.
    async fn find_highest(
        &self,
        recipient_id: &RecipientId,
    ) -> Result<Option<PlanCycle>, DomainError>;

    /// Delete a cycle with its statuses and deliverables.
    ///
    /// Child rows go first when the storage layer lacks native cascade.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &CycleId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CycleRepository) {}
    }
}
