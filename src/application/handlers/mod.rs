//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod calendar;
pub mod plan;

pub use calendar::{ReminderScheduler, ScheduleOutcome, SyncPendingHandler, SyncReport};
pub use plan::{
    CycleRolloverManager, RecordDeliverableCommand, RecordDeliverableError,
    RecordDeliverableHandler, RecordDeliverableResult, RevertDeliverableCommand,
    RevertDeliverableError, RevertDeliverableHandler, RevertDeliverableResult,
    SetMonitoringLeadCommand, SetMonitoringLeadError, SetMonitoringLeadHandler,
    SetMonitoringLeadResult,
};
