//! Remote calendar adapters.

mod http_calendar;
mod mock_calendar;

pub use http_calendar::{CalendarApiConfig, HttpCalendarAdapter};
pub use mock_calendar::MockRemoteCalendar;
