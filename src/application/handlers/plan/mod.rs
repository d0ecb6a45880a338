//! Plan command handlers.
//!
//! Handlers for deliverable uploads, reverts, lead-time edits, and the
//! cycle rollover they drive.

pub(crate) mod record_deliverable;
pub(crate) mod revert_deliverable;
pub(crate) mod rollover_cycle;
pub(crate) mod set_monitoring_lead;

pub use record_deliverable::{
    RecordDeliverableCommand, RecordDeliverableError, RecordDeliverableHandler,
    RecordDeliverableResult,
};
pub use revert_deliverable::{
    RevertDeliverableCommand, RevertDeliverableError, RevertDeliverableHandler,
    RevertDeliverableResult,
};
pub use rollover_cycle::CycleRolloverManager;
pub use set_monitoring_lead::{
    SetMonitoringLeadCommand, SetMonitoringLeadError, SetMonitoringLeadHandler,
    SetMonitoringLeadResult,
};
