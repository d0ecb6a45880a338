//! In-memory `RemoteCalendar` for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::DomainError;
use crate::ports::{CalendarToken, EventDraft, RemoteCalendar};

/// Recording mock for the remote calendar.
///
/// Hands out sequential remote ids and records every created draft and
/// deleted id. `failing()` rejects every call; an event titled
/// [`MockRemoteCalendar::POISON_TITLE`] fails creation while everything
/// else succeeds.
pub struct MockRemoteCalendar {
    fail_all: bool,
    next_id: AtomicUsize,
    created: Mutex<Vec<EventDraft>>,
    deleted: Mutex<Vec<String>>,
}

impl MockRemoteCalendar {
    /// Title that makes `create_event` fail for one event.
    pub const POISON_TITLE: &'static str = "mock-calendar-poison";

    pub fn new() -> Self {
        Self {
            fail_all: false,
            next_id: AtomicUsize::new(1),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// A calendar whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            next_id: AtomicUsize::new(1),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn created_events(&self) -> Vec<EventDraft> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted_events(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl Default for MockRemoteCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCalendar for MockRemoteCalendar {
    async fn authenticate(&self, _credential: &SecretString) -> Result<CalendarToken, DomainError> {
        if self.fail_all {
            return Err(DomainError::calendar("Mock authentication failure"));
        }
        Ok(CalendarToken::new("mock-token"))
    }

    async fn create_event(
        &self,
        _token: &CalendarToken,
        _calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<String, DomainError> {
        if self.fail_all || draft.title == Self::POISON_TITLE {
            return Err(DomainError::calendar("Mock event creation failure"));
        }
        self.created.lock().unwrap().push(draft.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("remote-event-{}", id))
    }

    async fn delete_event(
        &self,
        _token: &CalendarToken,
        _calendar_id: &str,
        remote_event_id: &str,
    ) -> Result<(), DomainError> {
        if self.fail_all {
            return Err(DomainError::calendar("Mock event deletion failure"));
        }
        self.deleted
            .lock()
            .unwrap()
            .push(remote_event_id.to_string());
        Ok(())
    }
}
