//! SyncPendingHandler - pushes pending reminder events to the remote
//! calendar.
//!
//! Runs from the periodic sync daemon or an explicit trigger. Events
//! are grouped by tenant; within a tenant each event's outcome is
//! independent. Failed events stay failed until something re-triggers
//! the sync; nothing here retries on its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::plan::ReminderEvent;
use crate::ports::{
    CalendarAccountReader, CalendarToken, EventDraft, ReminderEventRepository, RemoteCalendar,
};

/// Failure reason recorded on every pending event of a tenant without a
/// usable calendar connection.
const NO_ACCOUNT_REASON: &str = "no connected calendar account for tenant";

/// Counts of per-event outcomes from one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

/// Handler that delivers pending reminder events.
pub struct SyncPendingHandler {
    reminders: Arc<dyn ReminderEventRepository>,
    accounts: Arc<dyn CalendarAccountReader>,
    calendar: Arc<dyn RemoteCalendar>,
}

impl SyncPendingHandler {
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

    /// Delivers all pending events, optionally for a single tenant.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` when listing pending events fails; per-event
    ///   delivery and bookkeeping failures are recorded, not raised
    pub async fn handle(
        &self,
        tenant_filter: Option<TenantId>,
    ) -> Result<SyncReport, DomainError> {
        let pending = self.reminders.list_pending(tenant_filter).await?;
        if pending.is_empty() {
            return Ok(SyncReport::default());
        }

        let mut by_tenant: BTreeMap<TenantId, Vec<ReminderEvent>> = BTreeMap::new();
        for event in pending {
            by_tenant.entry(event.tenant_id()).or_default().push(event);
        }

        let mut report = SyncReport::default();
        for (tenant_id, events) in by_tenant {
            let tenant_report = self.sync_tenant(tenant_id, events).await;
            report.synced += tenant_report.synced;
            report.failed += tenant_report.failed;
        }

        tracing::info!(
            synced = report.synced,
            failed = report.failed,
            "Calendar sync run finished"
        );
        Ok(report)
    }

    async fn sync_tenant(&self, tenant_id: TenantId, events: Vec<ReminderEvent>) -> SyncReport {
        let account = match self.accounts.find_by_tenant(&tenant_id).await {
            Ok(Some(account)) if account.is_connected() => account,
            Ok(_) => {
                return self.fail_all(events, NO_ACCOUNT_REASON).await;
            }
            Err(err) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    error = %err,
                    "Calendar account lookup failed; marking tenant batch failed"
                );
                return self.fail_all(events, err.message).await;
            }
        };

        let token = match self.calendar.authenticate(account.credential()).await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    error = %err,
                    "Calendar authentication failed; marking tenant batch failed"
                );
                return self.fail_all(events, err.message).await;
            }
        };

        let mut report = SyncReport::default();
        for event in events {
            if self.push_event(&token, account.calendar_id(), event).await {
                report.synced += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    /// Returns whether the event ended up synced.
    async fn push_event(
        &self,
        token: &CalendarToken,
        calendar_id: &str,
        mut event: ReminderEvent,
    ) -> bool {
        let draft = EventDraft {
            title: event.title().to_string(),
            description: event.description().map(str::to_string),
            start: event.window().start,
            end: event.window().end,
        };

        let synced = match self.calendar.create_event(token, calendar_id, &draft).await {
            Ok(remote_id) => {
                event.mark_synced(remote_id);
                true
            }
            Err(err) => {
                tracing::warn!(
                    event_id = %event.id(),
                    error = %err,
                    "Remote event creation failed"
                );
                event.mark_failed(err.message);
                false
            }
        };

        if let Err(err) = self.reminders.update_sync(&event).await {
            tracing::warn!(
                event_id = %event.id(),
                error = %err,
                "Failed to persist sync outcome"
            );
            return false;
        }
        synced
    }

    async fn fail_all(&self, events: Vec<ReminderEvent>, reason: impl Into<String>) -> SyncReport {
        let reason = reason.into();
        let mut report = SyncReport::default();
        for mut event in events {
            event.mark_failed(reason.clone());
            if let Err(err) = self.reminders.update_sync(&event).await {
                tracing::warn!(
                    event_id = %event.id(),
                    error = %err,
                    "Failed to persist sync failure"
                );
            }
            report.failed += 1;
        }
        report
    }
}
