//! PostgreSQL implementation of CalendarAccountReader.

use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::plan::{CalendarAccount, ConnectionStatus};
use crate::ports::CalendarAccountReader;

/// PostgreSQL implementation of CalendarAccountReader.
#[derive(Clone)]
pub struct PostgresCalendarAccountReader {
    pool: PgPool,
}

impl PostgresCalendarAccountReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarAccountReader for PostgresCalendarAccountReader {
    async fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<CalendarAccount>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, calendar_id, credential, status
            FROM calendar_accounts WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch calendar account: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.get("id");
        let tenant_id: Uuid = row.get("tenant_id");
        let calendar_id: String = row.get("calendar_id");
        let credential: String = row.get("credential");
        let status: String = row.get("status");

        let status = ConnectionStatus::parse(&status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Unknown connection status in storage: {}", status),
            )
        })?;

        Ok(Some(CalendarAccount::new(
            id,
            TenantId::from_uuid(tenant_id),
            calendar_id,
            SecretString::new(credential.into()),
            status,
        )))
    }
}
