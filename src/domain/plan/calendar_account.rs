//! CalendarAccount entity - a tenant's remote calendar connection.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::TenantId;

/// Connection state of a tenant's calendar account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    NotConnected,
    Error,
}

impl ConnectionStatus {
    /// Returns the stable snake_case name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::NotConnected => "not_connected",
            ConnectionStatus::Error => "error",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connected" => Some(ConnectionStatus::Connected),
            "not_connected" => Some(ConnectionStatus::NotConnected),
            "error" => Some(ConnectionStatus::Error),
            _ => None,
        }
    }
}

/// A tenant's remote calendar account.
///
/// The credential blob is whatever the remote calendar's authenticate
/// call expects; it is opaque here and never logged.
#[derive(Clone)]
pub struct CalendarAccount {
    id: Uuid,
    tenant_id: TenantId,
    calendar_id: String,
    credential: SecretString,
    status: ConnectionStatus,
}

impl CalendarAccount {
    pub fn new(
        id: Uuid,
        tenant_id: TenantId,
        calendar_id: impl Into<String>,
        credential: SecretString,
        status: ConnectionStatus,
    ) -> Self {
        Self {
            id,
            tenant_id,
            calendar_id: calendar_id.into(),
            credential,
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn credential(&self) -> &SecretString {
        &self.credential
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Whether events can be delivered through this account.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

impl std::fmt::Debug for CalendarAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarAccount")
            .field("id", &self.id)
            .field("tenant_id", &self.tenant_id)
            .field("calendar_id", &self.calendar_id)
            .field("credential", &"[REDACTED]")
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(status: ConnectionStatus) -> CalendarAccount {
        CalendarAccount::new(
            Uuid::new_v4(),
            TenantId::new(),
            "primary-calendar",
            SecretString::new("{\"client_email\":\"svc@example.com\"}".into()),
            status,
        )
    }

    #[test]
    fn only_connected_accounts_deliver() {
        assert!(account(ConnectionStatus::Connected).is_connected());
        assert!(!account(ConnectionStatus::NotConnected).is_connected());
        assert!(!account(ConnectionStatus::Error).is_connected());
    }

    #[test]
    fn debug_never_exposes_the_credential() {
        let output = format!("{:?}", account(ConnectionStatus::Connected));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("client_email"));
    }

    #[test]
    fn connection_status_parse_round_trips() {
        for status in [
            ConnectionStatus::Connected,
            ConnectionStatus::NotConnected,
            ConnectionStatus::Error,
        ] {
            assert_eq!(ConnectionStatus::parse(status.as_str()), Some(status));
        }
    }
}
