//! ReminderScheduler - plans and retracts deadline reminder windows.
//!
//! Scheduling is best-effort from the caller's point of view: outcomes
//! are returned as data and callers log-and-continue. Nothing here ever
//! aborts the business operation that triggered it.

use std::sync::Arc;

use crate::domain::foundation::{
    CalendarDate, CycleId, DomainError, ErrorCode, StatusId,
};
use crate::domain::plan::{PlanCycle, ReminderEvent, ReminderKind, ReminderReference, ReminderWindow};
use crate::ports::{CalendarAccountReader, InsertOutcome, ReminderEventRepository, RemoteCalendar};

/// Days before "now" at which the renewal window opens.
///
/// Computed from the scheduling moment, not from the cycle's start date;
/// a delayed schedule shifts the window with it.
const RENEWAL_WINDOW_LEAD_DAYS: i64 = 150;

/// Width of the next-cycle-start window in days.
const NEXT_CYCLE_WINDOW_DAYS: i64 = 7;

/// Result of a scheduling attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// A new pending event was persisted.
    Scheduled(ReminderEvent),
    /// An event for the same (reference, kind) already exists.
    AlreadyScheduled,
    /// The tenant has no connected calendar account; nothing persisted.
    NoCalendarAccount,
    /// The cycle is not eligible for this window kind.
    NotApplicable,
}

/// Scheduler for renewal-deadline and next-cycle-start windows.
pub struct ReminderScheduler {
    reminders: Arc<dyn ReminderEventRepository>,
    accounts: Arc<dyn CalendarAccountReader>,
    calendar: Arc<dyn RemoteCalendar>,
}

impl ReminderScheduler {
    pub fn new(
        reminders: Arc<dyn ReminderEventRepository>,
        accounts: Arc<dyn CalendarAccountReader>,
        calendar: Arc<dyn RemoteCalendar>,
    ) -> Self {
        Self {
            reminders,
            accounts,
            calendar,
        }
    }

    /// Plans the renewal-deadline window for a cycle.
    ///
    /// The window opens 150 days from now at 09:00 and closes at 18:00 on
    /// the renewal deadline. At most one event per cycle exists.
    pub async fn schedule_renewal_window(
        &self,
        cycle: &PlanCycle,
    ) -> Result<ScheduleOutcome, DomainError> {
        let deadline = cycle.renewal_deadline().ok_or_else(|| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Cycle {} has no renewal deadline", cycle.id()),
            )
        })?;

        if !self.tenant_has_connected_account(cycle).await? {
            return Ok(ScheduleOutcome::NoCalendarAccount);
        }

        let reference = ReminderReference::Cycle(cycle.id());
        if self
            .reminders
            .exists(reference, ReminderKind::RenewalDeadline)
            .await?
        {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }

        let window = ReminderWindow::spanning(
            CalendarDate::today().plus_days(RENEWAL_WINDOW_LEAD_DAYS),
            deadline,
        );
        let event = ReminderEvent::new(
            cycle.tenant_id(),
            cycle.recipient_id(),
            reference,
            ReminderKind::RenewalDeadline,
            "Support plan renewal deadline",
            Some(format!(
                "Cycle {} renewal is due by {}",
                cycle.cycle_number(),
                deadline
            )),
            window,
        );

        self.persist(event).await
    }

    /// Plans the next-cycle-start window keyed to a monitoring status.
    ///
    /// Only cycles from number 2 onward get this window: a one-week span
    /// from the cycle's start date, independent of the status due date.
    pub async fn schedule_next_cycle_window(
        &self,
        cycle: &PlanCycle,
        status_id: StatusId,
    ) -> Result<ScheduleOutcome, DomainError> {
        if cycle.cycle_number() < 2 {
            return Ok(ScheduleOutcome::NotApplicable);
        }
        let start = cycle.start_date().ok_or_else(|| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Cycle {} has no start date", cycle.id()),
            )
        })?;

        if !self.tenant_has_connected_account(cycle).await? {
            return Ok(ScheduleOutcome::NoCalendarAccount);
        }

        let reference = ReminderReference::Status(status_id);
        if self
            .reminders
            .exists(reference, ReminderKind::NextCycleStart)
            .await?
        {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }

        let window = ReminderWindow::spanning(start, start.plus_days(NEXT_CYCLE_WINDOW_DAYS));
        let event = ReminderEvent::new(
            cycle.tenant_id(),
            cycle.recipient_id(),
            reference,
            ReminderKind::NextCycleStart,
            "Next support plan cycle start",
            Some(format!(
                "Cycle {} should start in the week from {}",
                cycle.cycle_number(),
                start
            )),
            window,
        );

        self.persist(event).await
    }

    /// Plans a precise single-day next-cycle-start window at a due date.
    ///
    /// Used when an operator edits the lead time. Shares the (status,
    /// next_cycle_start) idempotency key: a no-op when an event already
    /// exists.
    pub async fn schedule_precise_deadline(
        &self,
        cycle: &PlanCycle,
        status_id: StatusId,
        due_date: CalendarDate,
    ) -> Result<ScheduleOutcome, DomainError> {
        if !self.tenant_has_connected_account(cycle).await? {
            return Ok(ScheduleOutcome::NoCalendarAccount);
        }

        let reference = ReminderReference::Status(status_id);
        if self
            .reminders
            .exists(reference, ReminderKind::NextCycleStart)
            .await?
        {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }

        let event = ReminderEvent::new(
            cycle.tenant_id(),
            cycle.recipient_id(),
            reference,
            ReminderKind::NextCycleStart,
            "Next support plan cycle start",
            Some(format!("Monitoring due on {}", due_date)),
            ReminderWindow::single_day(due_date),
        );

        self.persist(event).await
    }

    /// Retracts the event keyed to a cycle.
    ///
    /// Returns whether a local row existed.
    pub async fn retract_by_cycle(
        &self,
        cycle_id: CycleId,
        kind: ReminderKind,
    ) -> Result<bool, DomainError> {
        self.retract(ReminderReference::Cycle(cycle_id), kind).await
    }

    /// Retracts the event keyed to a status.
    ///
    /// Returns whether a local row existed.
    pub async fn retract_by_status(
        &self,
        status_id: StatusId,
        kind: ReminderKind,
    ) -> Result<bool, DomainError> {
        self.retract(ReminderReference::Status(status_id), kind).await
    }

    async fn retract(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<bool, DomainError> {
        let Some(event) = self.reminders.find_by_reference(reference, kind).await? else {
            return Ok(false);
        };

        // Remote deletion is best-effort; the local row goes away either
        // way.
        if let Some(remote_id) = event.remote_event_id() {
            match self.accounts.find_by_tenant(&event.tenant_id()).await {
                Ok(Some(account)) if account.is_connected() => {
                    let removal = async {
                        let token = self.calendar.authenticate(account.credential()).await?;
                        self.calendar
                            .delete_event(&token, account.calendar_id(), remote_id)
                            .await
                    };
                    if let Err(err) = removal.await {
                        tracing::warn!(
                            event_id = %event.id(),
                            remote_id,
                            error = %err,
                            "Failed to delete reminder event from remote calendar"
                        );
                    }
                }
                Ok(_) => {
                    tracing::warn!(
                        event_id = %event.id(),
                        tenant_id = %event.tenant_id(),
                        "No connected calendar account; skipping remote deletion"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        event_id = %event.id(),
                        error = %err,
                        "Calendar account lookup failed during retraction"
                    );
                }
            }
        }

        self.reminders.delete_by_reference(reference, kind).await
    }

    async fn tenant_has_connected_account(
        &self,
        cycle: &PlanCycle,
    ) -> Result<bool, DomainError> {
        Ok(self
            .accounts
            .find_by_tenant(&cycle.tenant_id())
            .await?
            .map(|account| account.is_connected())
            .unwrap_or(false))
    }

    async fn persist(&self, event: ReminderEvent) -> Result<ScheduleOutcome, DomainError> {
        // The storage uniqueness constraint is the authoritative guard;
        // losing the race after the exists() check is a benign no-op.
        match self.reminders.insert_if_absent(&event).await? {
            InsertOutcome::Inserted => Ok(ScheduleOutcome::Scheduled(event)),
            InsertOutcome::AlreadyExists => Ok(ScheduleOutcome::AlreadyScheduled),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::calendar::MockRemoteCalendar;
    use crate::domain::foundation::{RecipientId, StaffId, StepKind, SyncState, TenantId, Timestamp};
    use crate::domain::plan::{CalendarAccount, ConnectionStatus};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::Mutex;
    use uuid::Uuid;

    // ─────────────────────────────────────────────────────────────────────
    // Mock implementations
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) struct InMemoryReminderRepository {
        events: Mutex<Vec<ReminderEvent>>,
    }

    impl InMemoryReminderRepository {
        pub(crate) fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_event(event: ReminderEvent) -> Self {
            Self {
                events: Mutex::new(vec![event]),
            }
        }

        pub(crate) fn events(&self) -> Vec<ReminderEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReminderEventRepository for InMemoryReminderRepository {
        async fn insert_if_absent(
            &self,
            event: &ReminderEvent,
        ) -> Result<InsertOutcome, DomainError> {
            let mut events = self.events.lock().unwrap();
            if events
                .iter()
                .any(|e| e.reference() == event.reference() && e.kind() == event.kind())
            {
                return Ok(InsertOutcome::AlreadyExists);
            }
            events.push(event.clone());
            Ok(InsertOutcome::Inserted)
        }

        async fn exists(
            &self,
            reference: ReminderReference,
            kind: ReminderKind,
        ) -> Result<bool, DomainError> {
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .any(|e| e.reference() == reference && e.kind() == kind))
        }

        async fn find_by_reference(
            &self,
            reference: ReminderReference,
            kind: ReminderKind,
        ) -> Result<Option<ReminderEvent>, DomainError> {
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.reference() == reference && e.kind() == kind)
                .cloned())
        }

        async fn delete_by_reference(
            &self,
            reference: ReminderReference,
            kind: ReminderKind,
        ) -> Result<bool, DomainError> {
            let mut events = self.events.lock().unwrap();
            let before = events.len();
            events.retain(|e| !(e.reference() == reference && e.kind() == kind));
            Ok(events.len() < before)
        }

        async fn list_pending(
            &self,
            tenant_filter: Option<TenantId>,
        ) -> Result<Vec<ReminderEvent>, DomainError> {
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.sync_state() == SyncState::Pending)
                .filter(|e| tenant_filter.map(|t| e.tenant_id() == t).unwrap_or(true))
                .cloned()
                .collect())
        }

        async fn update_sync(&self, event: &ReminderEvent) -> Result<(), DomainError> {
            let mut events = self.events.lock().unwrap();
            if let Some(stored) = events.iter_mut().find(|e| e.id() == event.id()) {
                *stored = event.clone();
            }
            Ok(())
        }
    }

    pub(crate) struct StaticAccountReader {
        account: Option<CalendarAccount>,
    }

    impl StaticAccountReader {
        pub(crate) fn connected(tenant_id: TenantId) -> Self {
            Self {
                account: Some(CalendarAccount::new(
                    Uuid::new_v4(),
                    tenant_id,
                    "cal-primary",
                    SecretString::new("{\"token\":\"t\"}".into()),
                    ConnectionStatus::Connected,
                )),
            }
        }

        pub(crate) fn disconnected(tenant_id: TenantId) -> Self {
            Self {
                account: Some(CalendarAccount::new(
                    Uuid::new_v4(),
                    tenant_id,
                    "cal-primary",
                    SecretString::new("{\"token\":\"t\"}".into()),
                    ConnectionStatus::NotConnected,
                )),
            }
        }

        pub(crate) fn absent() -> Self {
            Self { account: None }
        }
    }

    #[async_trait]
    impl CalendarAccountReader for StaticAccountReader {
        async fn find_by_tenant(
            &self,
            tenant_id: &TenantId,
        ) -> Result<Option<CalendarAccount>, DomainError> {
            Ok(self
                .account
                .clone()
                .filter(|a| a.tenant_id() == *tenant_id))
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Test helpers
    // ─────────────────────────────────────────────────────────────────────

    fn completed_second_cycle() -> PlanCycle {
        let mut first = PlanCycle::first(TenantId::new(), RecipientId::new());
        for kind in StepKind::all() {
            first
                .record_step(*kind, StaffId::new(), Timestamp::now(), CalendarDate::today())
                .unwrap();
        }
        let completed_at = first
            .status(StepKind::Monitoring)
            .unwrap()
            .completed_at()
            .unwrap();
        PlanCycle::successor_of(&first, CalendarDate::today(), completed_at)
    }

    fn scheduler_for(
        cycle: &PlanCycle,
        reminders: Arc<InMemoryReminderRepository>,
    ) -> ReminderScheduler {
        ReminderScheduler::new(
            reminders,
            Arc::new(StaticAccountReader::connected(cycle.tenant_id())),
            Arc::new(MockRemoteCalendar::new()),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tests
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn renewal_window_persists_one_pending_event() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders.clone());

        let outcome = scheduler.schedule_renewal_window(&cycle).await.unwrap();

        let event = match outcome {
            ScheduleOutcome::Scheduled(event) => event,
            other => panic!("expected Scheduled, got {:?}", other),
        };
        assert_eq!(event.kind(), ReminderKind::RenewalDeadline);
        assert_eq!(event.reference(), ReminderReference::Cycle(cycle.id()));
        assert_eq!(event.sync_state(), SyncState::Pending);
        assert_eq!(reminders.events().len(), 1);
    }

    #[tokio::test]
    async fn renewal_window_opens_150_days_from_now() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders);

        let outcome = scheduler.schedule_renewal_window(&cycle).await.unwrap();

        let ScheduleOutcome::Scheduled(event) = outcome else {
            panic!("expected Scheduled");
        };
        // Pinned quirk: the window start tracks the scheduling moment,
        // not the cycle's start date.
        assert_eq!(
            event.window().start,
            CalendarDate::today().plus_days(150).at_hour(9)
        );
        assert_eq!(
            event.window().end,
            cycle.renewal_deadline().unwrap().at_hour(18)
        );
    }

    #[tokio::test]
    async fn renewal_window_is_idempotent() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders.clone());

        scheduler.schedule_renewal_window(&cycle).await.unwrap();
        let second = scheduler.schedule_renewal_window(&cycle).await.unwrap();

        assert_eq!(second, ScheduleOutcome::AlreadyScheduled);
        assert_eq!(reminders.events().len(), 1);
    }

    #[tokio::test]
    async fn renewal_window_requires_connected_account() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = ReminderScheduler::new(
            reminders.clone(),
            Arc::new(StaticAccountReader::disconnected(cycle.tenant_id())),
            Arc::new(MockRemoteCalendar::new()),
        );

        let outcome = scheduler.schedule_renewal_window(&cycle).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::NoCalendarAccount);
        assert!(reminders.events().is_empty());
    }

    #[tokio::test]
    async fn renewal_window_requires_any_account() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = ReminderScheduler::new(
            reminders.clone(),
            Arc::new(StaticAccountReader::absent()),
            Arc::new(MockRemoteCalendar::new()),
        );

        let outcome = scheduler.schedule_renewal_window(&cycle).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::NoCalendarAccount);
        assert!(reminders.events().is_empty());
    }

    #[tokio::test]
    async fn next_cycle_window_spans_one_week_from_start() {
        let cycle = completed_second_cycle();
        let status_id = cycle.status(StepKind::Monitoring).unwrap().id();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders);

        let outcome = scheduler
            .schedule_next_cycle_window(&cycle, status_id)
            .await
            .unwrap();

        let ScheduleOutcome::Scheduled(event) = outcome else {
            panic!("expected Scheduled");
        };
        let start = cycle.start_date().unwrap();
        assert_eq!(event.window().start, start.at_hour(9));
        assert_eq!(event.window().end, start.plus_days(7).at_hour(18));
        assert_eq!(event.reference(), ReminderReference::Status(status_id));
    }

    #[tokio::test]
    async fn next_cycle_window_skips_first_cycle() {
        let cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        let status_id = cycle.status(StepKind::Monitoring).unwrap().id();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders.clone());

        let outcome = scheduler
            .schedule_next_cycle_window(&cycle, status_id)
            .await
            .unwrap();

        assert_eq!(outcome, ScheduleOutcome::NotApplicable);
        assert!(reminders.events().is_empty());
    }

    #[tokio::test]
    async fn precise_deadline_is_single_day_and_shares_the_key() {
        let cycle = completed_second_cycle();
        let status_id = cycle.status(StepKind::Monitoring).unwrap().id();
        let due = CalendarDate::from_ymd(2024, 11, 20).unwrap();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders.clone());

        let outcome = scheduler
            .schedule_precise_deadline(&cycle, status_id, due)
            .await
            .unwrap();
        let ScheduleOutcome::Scheduled(event) = outcome else {
            panic!("expected Scheduled");
        };
        assert_eq!(event.window().start, due.at_hour(9));
        assert_eq!(event.window().end, due.at_hour(18));

        // The broad window can no longer be scheduled for the same status.
        let second = scheduler
            .schedule_next_cycle_window(&cycle, status_id)
            .await
            .unwrap();
        assert_eq!(second, ScheduleOutcome::AlreadyScheduled);
        assert_eq!(reminders.events().len(), 1);
    }

    #[tokio::test]
    async fn retract_deletes_local_row_and_reports_existence() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders.clone());
        scheduler.schedule_renewal_window(&cycle).await.unwrap();

        let existed = scheduler
            .retract_by_cycle(cycle.id(), ReminderKind::RenewalDeadline)
            .await
            .unwrap();

        assert!(existed);
        assert!(reminders.events().is_empty());
    }

    #[tokio::test]
    async fn retract_of_missing_event_returns_false() {
        let cycle = completed_second_cycle();
        let reminders = Arc::new(InMemoryReminderRepository::new());
        let scheduler = scheduler_for(&cycle, reminders);

        let existed = scheduler
            .retract_by_cycle(cycle.id(), ReminderKind::RenewalDeadline)
            .await
            .unwrap();

        assert!(!existed);
    }

    #[tokio::test]
    async fn retract_attempts_remote_deletion_for_synced_events() {
        let cycle = completed_second_cycle();
        let mut event = ReminderEvent::new(
            cycle.tenant_id(),
            cycle.recipient_id(),
            ReminderReference::Cycle(cycle.id()),
            ReminderKind::RenewalDeadline,
            "Support plan renewal deadline",
            None,
            ReminderWindow::single_day(CalendarDate::today()),
        );
        event.mark_synced("remote-42");
        let reminders = Arc::new(InMemoryReminderRepository::with_event(event));
        let calendar = Arc::new(MockRemoteCalendar::new());
        let scheduler = ReminderScheduler::new(
            reminders.clone(),
            Arc::new(StaticAccountReader::connected(cycle.tenant_id())),
            calendar.clone(),
        );

        let existed = scheduler
            .retract_by_cycle(cycle.id(), ReminderKind::RenewalDeadline)
            .await
            .unwrap();

        assert!(existed);
        assert_eq!(calendar.deleted_events(), vec!["remote-42".to_string()]);
        assert!(reminders.events().is_empty());
    }

    #[tokio::test]
    async fn retract_survives_remote_failure() {
        let cycle = completed_second_cycle();
        let mut event = ReminderEvent::new(
            cycle.tenant_id(),
            cycle.recipient_id(),
            ReminderReference::Cycle(cycle.id()),
            ReminderKind::RenewalDeadline,
            "Support plan renewal deadline",
            None,
            ReminderWindow::single_day(CalendarDate::today()),
        );
        event.mark_synced("remote-42");
        let reminders = Arc::new(InMemoryReminderRepository::with_event(event));
        let scheduler = ReminderScheduler::new(
            reminders.clone(),
            Arc::new(StaticAccountReader::connected(cycle.tenant_id())),
            Arc::new(MockRemoteCalendar::failing()),
        );

        let existed = scheduler
            .retract_by_cycle(cycle.id(), ReminderKind::RenewalDeadline)
            .await
            .unwrap();

        // Local deletion is unconditional.
        assert!(existed);
        assert!(reminders.events().is_empty());
    }
}
