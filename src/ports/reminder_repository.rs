//! Reminder event repository port.
//!
//! The at-most-one-event-per-(reference, kind) rule is enforced twice:
//! handlers check `exists` first, and the storage layer holds a
//! uniqueness constraint as the authoritative guard. A constraint
//! conflict on insert is a benign already-exists, not a failure.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::plan::{ReminderEvent, ReminderKind, ReminderReference};

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The event row was created.
    Inserted,
    /// An event for the same (reference, kind) already existed; nothing
    /// was written.
    AlreadyExists,
}

/// Repository port for reminder event persistence.
#[async_trait]
pub trait ReminderEventRepository: Send + Sync {
    /// Insert an event unless one already exists for its
    /// (reference, kind) key.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure other than the
    ///   uniqueness conflict
    async fn insert_if_absent(&self, event: &ReminderEvent) -> Result<InsertOutcome, DomainError>;

    /// Check whether an event exists for a (reference, kind) key.
    async fn exists(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<bool, DomainError>;

    /// Find the event for a (reference, kind) key.
    async fn find_by_reference(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<Option<ReminderEvent>, DomainError>;

    /// Delete the event for a (reference, kind) key.
    ///
    /// Returns whether a row existed to delete.
    async fn delete_by_reference(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<bool, DomainError>;

    /// List all pending events, optionally restricted to one tenant.
    async fn list_pending(
        &self,
        tenant_filter: Option<TenantId>,
    ) -> Result<Vec<ReminderEvent>, DomainError>;

    /// Persist an event's sync state, remote id, and last error.
    async fn update_sync(&self, event: &ReminderEvent) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn ReminderEventRepository) {}
    }
}
