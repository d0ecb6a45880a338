//! Calendar scheduling and sync handlers.

pub(crate) mod scheduler;
pub(crate) mod sync_pending;

pub use scheduler::{ReminderScheduler, ScheduleOutcome};
pub use sync_pending::{SyncPendingHandler, SyncReport};
