//! PostgreSQL implementation of ReminderEventRepository.
//!
//! The partial unique indexes on (cycle_id, kind) and (status_id, kind)
//! are the authoritative idempotency guard; `insert_if_absent` relies on
//! `ON CONFLICT DO NOTHING` and reports a zero-row insert as
//! already-exists.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, RecipientId, ReminderEventId, StatusId, SyncState, TenantId,
    Timestamp,
};
use crate::domain::plan::{ReminderEvent, ReminderKind, ReminderReference, ReminderWindow};
use crate::ports::{InsertOutcome, ReminderEventRepository};

/// PostgreSQL implementation of ReminderEventRepository.
#[derive(Clone)]
pub struct PostgresReminderRepository {
    pool: PgPool,
}

impl PostgresReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn reference_columns(reference: ReminderReference) -> (Option<Uuid>, Option<Uuid>) {
    match reference {
        ReminderReference::Cycle(id) => (Some(*id.as_uuid()), None),
        ReminderReference::Status(id) => (None, Some(*id.as_uuid())),
    }
}

#[async_trait]
impl ReminderEventRepository for PostgresReminderRepository {
    async fn insert_if_absent(&self, event: &ReminderEvent) -> Result<InsertOutcome, DomainError> {
        let (cycle_id, status_id) = reference_columns(event.reference());

        let result = sqlx::query(
            r#"
            INSERT INTO reminder_events (
                id, tenant_id, recipient_id, cycle_id, status_id, kind,
                title, description, window_start, window_end, sync_state,
                remote_event_id, last_error, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(event.id().as_uuid())
        .bind(event.tenant_id().as_uuid())
        .bind(event.recipient_id().as_uuid())
        .bind(cycle_id)
        .bind(status_id)
        .bind(event.kind().as_str())
        .bind(event.title())
        .bind(event.description())
        .bind(event.window().start.as_datetime())
        .bind(event.window().end.as_datetime())
        .bind(event.sync_state().as_str())
        .bind(event.remote_event_id())
        .bind(event.last_error())
        .bind(event.created_at().as_datetime())
        .bind(event.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert reminder event: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn exists(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<bool, DomainError> {
        let (cycle_id, status_id) = reference_columns(reference);
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM reminder_events
            WHERE cycle_id IS NOT DISTINCT FROM $1
              AND status_id IS NOT DISTINCT FROM $2
              AND kind = $3
            "#,
        )
        .bind(cycle_id)
        .bind(status_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check reminder event: {}", e)))?;

        Ok(result.0 > 0)
    }

    async fn find_by_reference(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<Option<ReminderEvent>, DomainError> {
        let (cycle_id, status_id) = reference_columns(reference);
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, recipient_id, cycle_id, status_id, kind,
                   title, description, window_start, window_end, sync_state,
                   remote_event_id, last_error, created_at, updated_at
            FROM reminder_events
            WHERE cycle_id IS NOT DISTINCT FROM $1
              AND status_id IS NOT DISTINCT FROM $2
              AND kind = $3
            "#,
        )
        .bind(cycle_id)
        .bind(status_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch reminder event: {}", e)))?;

        row.map(row_to_event).transpose()
    }

    async fn delete_by_reference(
        &self,
        reference: ReminderReference,
        kind: ReminderKind,
    ) -> Result<bool, DomainError> {
        let (cycle_id, status_id) = reference_columns(reference);
        let result = sqlx::query(
            r#"
            DELETE FROM reminder_events
            WHERE cycle_id IS NOT DISTINCT FROM $1
              AND status_id IS NOT DISTINCT FROM $2
              AND kind = $3
            "#,
        )
        .bind(cycle_id)
        .bind(status_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to delete reminder event: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_pending(
        &self,
        tenant_filter: Option<TenantId>,
    ) -> Result<Vec<ReminderEvent>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, recipient_id, cycle_id, status_id, kind,
                   title, description, window_start, window_end, sync_state,
                   remote_event_id, last_error, created_at, updated_at
            FROM reminder_events
            WHERE sync_state = 'pending'
              AND ($1::uuid IS NULL OR tenant_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_filter.map(|t| *t.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list pending events: {}", e)))?;

        rows.into_iter().map(row_to_event).collect()
    }

    async fn update_sync(&self, event: &ReminderEvent) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE reminder_events SET
                sync_state = $2,
                remote_event_id = $3,
                last_error = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(event.id().as_uuid())
        .bind(event.sync_state().as_str())
        .bind(event.remote_event_id())
        .bind(event.last_error())
        .bind(event.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update sync state: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Reminder event not found: {}", event.id()),
            ));
        }
        Ok(())
    }
}

fn row_to_event(row: sqlx::postgres::PgRow) -> Result<ReminderEvent, DomainError> {
    let id: Uuid = row.get("id");
    let tenant_id: Uuid = row.get("tenant_id");
    let recipient_id: Uuid = row.get("recipient_id");
    let cycle_id: Option<Uuid> = row.get("cycle_id");
    let status_id: Option<Uuid> = row.get("status_id");
    let kind: String = row.get("kind");
    let title: String = row.get("title");
    let description: Option<String> = row.get("description");
    let window_start: chrono::DateTime<chrono::Utc> = row.get("window_start");
    let window_end: chrono::DateTime<chrono::Utc> = row.get("window_end");
    let sync_state: String = row.get("sync_state");
    let remote_event_id: Option<String> = row.get("remote_event_id");
    let last_error: Option<String> = row.get("last_error");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    let reference = match (cycle_id, status_id) {
        (Some(id), None) => ReminderReference::Cycle(CycleId::from_uuid(id)),
        (None, Some(id)) => ReminderReference::Status(StatusId::from_uuid(id)),
        _ => {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Reminder event must reference exactly one of cycle or status",
            ))
        }
    };

    let kind = ReminderKind::parse(&kind).ok_or_else(|| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Unknown reminder kind in storage: {}", kind),
        )
    })?;
    let sync_state = SyncState::parse(&sync_state).ok_or_else(|| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Unknown sync state in storage: {}", sync_state),
        )
    })?;

    Ok(ReminderEvent::from_parts(
        ReminderEventId::from_uuid(id),
        TenantId::from_uuid(tenant_id),
        RecipientId::from_uuid(recipient_id),
        reference,
        kind,
        title,
        description,
        ReminderWindow {
            start: Timestamp::from_datetime(window_start),
            end: Timestamp::from_datetime(window_end),
        },
        sync_state,
        remote_event_id,
        last_error,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
