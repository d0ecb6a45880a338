//! Sync state of a reminder event against the remote calendar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery state of a reminder event.
///
/// `Failed` is terminal for this crate; re-delivery requires an external
/// re-trigger, never an automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    Synced,
    Failed,
}

impl SyncState {
    /// Returns the stable snake_case name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
            SyncState::Failed => "failed",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SyncState::Pending),
            "synced" => Some(SyncState::Synced),
            "failed" => Some(SyncState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
