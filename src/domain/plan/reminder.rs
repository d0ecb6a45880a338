//! ReminderEvent entity - a scheduled calendar window for a deadline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    CalendarDate, CycleId, RecipientId, ReminderEventId, StatusId, SyncState, TenantId, Timestamp,
};

/// What deadline a reminder event communicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// The cycle's 180-day renewal deadline.
    RenewalDeadline,
    /// The window in which the next cycle must start.
    NextCycleStart,
}

impl ReminderKind {
    /// Returns the stable snake_case name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::RenewalDeadline => "renewal_deadline",
            ReminderKind::NextCycleStart => "next_cycle_start",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "renewal_deadline" => Some(ReminderKind::RenewalDeadline),
            "next_cycle_start" => Some(ReminderKind::NextCycleStart),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single entity a reminder event is keyed to: a cycle for
/// renewal-deadline events, a status for next-cycle-start events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum ReminderReference {
    Cycle(CycleId),
    Status(StatusId),
}

/// A start/end time range shown on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ReminderWindow {
    /// A multi-day window: 09:00 on the start date through 18:00 on the
    /// end date.
    pub fn spanning(start: CalendarDate, end: CalendarDate) -> Self {
        Self {
            start: start.at_hour(9),
            end: end.at_hour(18),
        }
    }

    /// A single-day 09:00-18:00 window.
    pub fn single_day(date: CalendarDate) -> Self {
        Self::spanning(date, date)
    }
}

/// A scheduled notification window pending delivery to the remote
/// calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderEvent {
    id: ReminderEventId,
    tenant_id: TenantId,
    recipient_id: RecipientId,
    reference: ReminderReference,
    kind: ReminderKind,
    title: String,
    description: Option<String>,
    window: ReminderWindow,
    sync_state: SyncState,
    remote_event_id: Option<String>,
    last_error: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ReminderEvent {
    /// Creates a pending event.
    pub fn new(
        tenant_id: TenantId,
        recipient_id: RecipientId,
        reference: ReminderReference,
        kind: ReminderKind,
        title: impl Into<String>,
        description: Option<String>,
        window: ReminderWindow,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: ReminderEventId::new(),
            tenant_id,
            recipient_id,
            reference,
            kind,
            title: title.into(),
            description,
            window,
            sync_state: SyncState::Pending,
            remote_event_id: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs an event from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ReminderEventId,
        tenant_id: TenantId,
        recipient_id: RecipientId,
        reference: ReminderReference,
        kind: ReminderKind,
        title: String,
        description: Option<String>,
        window: ReminderWindow,
        sync_state: SyncState,
        remote_event_id: Option<String>,
        last_error: Option<String>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            tenant_id,
            recipient_id,
            reference,
            kind,
            title,
            description,
            window,
            sync_state,
            remote_event_id,
            last_error,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ReminderEventId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn recipient_id(&self) -> RecipientId {
        self.recipient_id
    }

    pub fn reference(&self) -> ReminderReference {
        self.reference
    }

    pub fn kind(&self) -> ReminderKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn window(&self) -> ReminderWindow {
        self.window
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn remote_event_id(&self) -> Option<&str> {
        self.remote_event_id.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Records a successful remote creation.
    pub fn mark_synced(&mut self, remote_event_id: impl Into<String>) {
        self.sync_state = SyncState::Synced;
        self.remote_event_id = Some(remote_event_id.into());
        self.last_error = None;
        self.updated_at = Timestamp::now();
    }

    /// Records a delivery failure as data; no retry happens here.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.sync_state = SyncState::Failed;
        self.last_error = Some(reason.into());
        self.updated_at = Timestamp::now();
    }
}
