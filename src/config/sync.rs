//! Calendar sync configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Calendar sync configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the calendar API
    #[serde(default = "default_calendar_base_url")]
    pub calendar_base_url: String,

    /// Minutes between sync runs
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl SyncConfig {
    /// Get the sync interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Validate sync configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.calendar_base_url.starts_with("http://")
            && !self.calendar_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidCalendarBaseUrl);
        }
        if self.interval_minutes == 0 {
            return Err(ValidationError::InvalidSyncInterval);
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            calendar_base_url: default_calendar_base_url(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

fn default_calendar_base_url() -> String {
    "https://calendar.googleapis.com/calendar/v3".to_string()
}

fn default_interval_minutes() -> u64 {
    5
}
