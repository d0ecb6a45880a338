//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the Carepath domain.

mod command;
mod date;
mod deliverable_kind;
mod errors;
mod ids;
mod step_kind;
mod sync_state;
mod timestamp;

pub use command::CommandMetadata;
pub use date::CalendarDate;
pub use deliverable_kind::DeliverableKind;
pub use errors::{DomainError, ErrorCode};
pub use ids::{
    CycleId, DeliverableId, RecipientId, ReminderEventId, StaffId, StatusId, TenantId,
};
pub use step_kind::StepKind;
pub use sync_state::SyncState;
pub use timestamp::Timestamp;
