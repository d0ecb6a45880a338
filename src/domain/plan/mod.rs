//! Plan domain - cycles, step statuses, deliverables, reminders.

mod calendar_account;
mod cycle;
mod deliverable;
mod reminder;
mod status;

pub use calendar_account::{CalendarAccount, ConnectionStatus};
pub use cycle::{PlanCycle, StepCompletion, DEFAULT_NEXT_CYCLE_LEAD_DAYS, RENEWAL_HORIZON_DAYS};
pub use deliverable::{ArtifactRef, Deliverable};
pub use reminder::{ReminderEvent, ReminderKind, ReminderReference, ReminderWindow};
pub use status::StepStatus;
