//! Remote calendar port.
//!
//! Narrow capability interface over whatever calendar vendor the tenant
//! connects: authenticate once, then create/delete events. Timeouts and
//! backoff are the adapter's concern; callers treat every call as a
//! plain fallible operation.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::{DomainError, Timestamp};

/// An authenticated session handle for one tenant's calendar.
///
/// Opaque to callers; adapters put whatever token material they need
/// inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarToken(String);

impl CalendarToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The fields of an event to create remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Capability interface to the external calendar.
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    /// Authenticate with a tenant's credential blob.
    ///
    /// # Errors
    ///
    /// - `CalendarError` when the credential is rejected or the remote
    ///   is unreachable
    async fn authenticate(&self, credential: &SecretString) -> Result<CalendarToken, DomainError>;

    /// Create an event; returns the remote event id.
    ///
    /// # Errors
    ///
    /// - `CalendarError` on any remote failure
    async fn create_event(
        &self,
        token: &CalendarToken,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<String, DomainError>;

    /// Delete an event by its remote id.
    ///
    /// # Errors
    ///
    /// - `CalendarError` on any remote failure
    async fn delete_event(
        &self,
        token: &CalendarToken,
        calendar_id: &str,
        remote_event_id: &str,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_calendar_is_object_safe() {
        fn _accepts_dyn(_calendar: &dyn RemoteCalendar) {}
    }
}
