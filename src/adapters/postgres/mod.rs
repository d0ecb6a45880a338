//! PostgreSQL adapters for the repository ports.

mod calendar_account_reader;
mod cycle_repository;
mod deliverable_repository;
mod reminder_repository;

pub use calendar_account_reader::PostgresCalendarAccountReader;
pub use cycle_repository::PostgresCycleRepository;
pub use deliverable_repository::PostgresDeliverableRepository;
pub use reminder_repository::PostgresReminderRepository;
