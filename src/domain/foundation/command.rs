//! Command metadata that flows through command processing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StaffId;

/// Metadata context for command handlers.
///
/// Carries the acting staff member plus tracing context through the
/// command pipeline. Handlers stamp `staff_id` onto completed statuses
/// and uploaded deliverables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The staff member executing this command.
    pub staff_id: StaffId,

    /// Links related operations across a single request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g. "api", "scheduler").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata for an acting staff member.
    pub fn new(staff_id: StaffId) -> Self {
        Self {
            staff_id,
            correlation_id: None,
            source: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Creates a test fixture with a fixed correlation id.
    pub fn test_fixture() -> Self {
        Self::new(StaffId::new())
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_optional_fields() {
        let metadata = CommandMetadata::new(StaffId::new());
        assert!(metadata.source().is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let metadata = CommandMetadata::new(StaffId::new())
            .with_correlation_id("corr-1")
            .with_source("api");

        assert_eq!(metadata.correlation_id(), "corr-1");
        assert_eq!(metadata.source(), Some("api"));
    }

    #[test]
    fn correlation_id_generated_when_missing() {
        let metadata = CommandMetadata::new(StaffId::new());
        assert!(!metadata.correlation_id().is_empty());
    }

    #[test]
    fn serialization_skips_none_fields() {
        let json = serde_json::to_string(&CommandMetadata::new(StaffId::new())).unwrap();
        assert!(json.contains("staff_id"));
        assert!(!json.contains("correlation_id"));
        assert!(!json.contains("source"));
    }
}
