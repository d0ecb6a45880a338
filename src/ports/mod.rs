//! Ports - capability interfaces between the application core and the
//! outside world.

mod calendar_account_reader;
mod cycle_repository;
mod deliverable_repository;
mod reminder_repository;
mod remote_calendar;

pub use calendar_account_reader::CalendarAccountReader;
pub use cycle_repository::CycleRepository;
pub use deliverable_repository::DeliverableRepository;
pub use reminder_repository::{InsertOutcome, ReminderEventRepository};
pub use remote_calendar::{CalendarToken, EventDraft, RemoteCalendar};
