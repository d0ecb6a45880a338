//! PostgreSQL implementation of DeliverableRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    CycleId, DeliverableId, DeliverableKind, DomainError, ErrorCode, StaffId, Timestamp,
};
use crate::domain::plan::{ArtifactRef, Deliverable};
use crate::ports::DeliverableRepository;

/// PostgreSQL implementation of DeliverableRepository.
#[derive(Clone)]
pub struct PostgresDeliverableRepository {
    pool: PgPool,
}

impl PostgresDeliverableRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliverableRepository for PostgresDeliverableRepository {
    async fn save(&self, deliverable: &Deliverable) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO deliverables (
                id, cycle_id, kind, artifact, original_filename,
                uploaded_by, uploaded_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(deliverable.id().as_uuid())
        .bind(deliverable.cycle_id().as_uuid())
        .bind(deliverable.kind().as_str())
        .bind(deliverable.artifact().as_str())
        .bind(deliverable.original_filename())
        .bind(deliverable.uploaded_by().as_uuid())
        .bind(deliverable.uploaded_at().as_datetime())
        .bind(deliverable.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert deliverable: {}", e)))?;
        Ok(())
    }

    async fn update(&self, deliverable: &Deliverable) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE deliverables SET
                artifact = $2,
                original_filename = $3,
                uploaded_by = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(deliverable.id().as_uuid())
        .bind(deliverable.artifact().as_str())
        .bind(deliverable.original_filename())
        .bind(deliverable.uploaded_by().as_uuid())
        .bind(deliverable.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update deliverable: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DeliverableNotFound,
                format!("Deliverable not found: {}", deliverable.id()),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &DeliverableId) -> Result<Option<Deliverable>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, cycle_id, kind, artifact, original_filename,
                   uploaded_by, uploaded_at, updated_at
            FROM deliverables WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch deliverable: {}", e)))?;

        row.map(row_to_deliverable).transpose()
    }

    async fn find_by_cycle_and_kind(
        &self,
        cycle_id: &CycleId,
        kind: DeliverableKind,
    ) -> Result<Option<Deliverable>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, cycle_id, kind, artifact, original_filename,
                   uploaded_by, uploaded_at, updated_at
            FROM deliverables WHERE cycle_id = $1 AND kind = $2
            "#,
        )
        .bind(cycle_id.as_uuid())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch deliverable: {}", e)))?;

        row.map(row_to_deliverable).transpose()
    }

    async fn delete(&self, id: &DeliverableId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM deliverables WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete deliverable: {}", e)))?;
        Ok(())
    }
}

fn row_to_deliverable(row: sqlx::postgres::PgRow) -> Result<Deliverable, DomainError> {
    let id: Uuid = row.get("id");
    let cycle_id: Uuid = row.get("cycle_id");
    let kind: String = row.get("kind");
    let artifact: String = row.get("artifact");
    let original_filename: String = row.get("original_filename");
    let uploaded_by: Uuid = row.get("uploaded_by");
    let uploaded_at: chrono::DateTime<chrono::Utc> = row.get("uploaded_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    let kind: DeliverableKind = kind.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Unknown deliverable kind in storage: {}", kind),
        )
    })?;

    Ok(Deliverable::from_parts(
        DeliverableId::from_uuid(id),
        CycleId::from_uuid(cycle_id),
        kind,
        ArtifactRef::new(artifact),
        original_filename,
        StaffId::from_uuid(uploaded_by),
        Timestamp::from_datetime(uploaded_at),
        Timestamp::from_datetime(updated_at),
    ))
}
