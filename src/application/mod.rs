//! Application layer - commands and handlers.
//!
//! Orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    CycleRolloverManager, RecordDeliverableHandler, ReminderScheduler, RevertDeliverableHandler,
    SetMonitoringLeadHandler, SyncPendingHandler,
};
