//! PostgreSQL implementation of CycleRepository.
//!
//! Persists PlanCycle aggregates across the plan_cycles and
//! step_statuses tables; a cycle and its five statuses move as one
//! transactional unit.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    CalendarDate, CycleId, DomainError, ErrorCode, RecipientId, StaffId, StatusId, StepKind,
    TenantId, Timestamp,
};
use crate::domain::plan::{PlanCycle, StepStatus};
use crate::ports::CycleRepository;

/// PostgreSQL implementation of CycleRepository.
#[derive(Clone)]
pub struct PostgresCycleRepository {
    pool: PgPool,
}

impl PostgresCycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_aggregate(&self, row: sqlx::postgres::PgRow) -> Result<PlanCycle, DomainError> {
        let id = CycleId::from_uuid(row.get("id"));
        let statuses = load_statuses(&self.pool, &id).await?;
        row_to_cycle(row, statuses)
    }
}

#[async_trait]
impl CycleRepository for PostgresCycleRepository {
    async fn create(&self, cycle: &PlanCycle) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to begin transaction: {}", e))
        })?;

        insert_cycle(&mut tx, cycle).await?;

        tx.commit().await.map_err(|e| {
            DomainError::database(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }

    async fn update(&self, cycle: &PlanCycle) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to begin transaction: {}", e))
        })?;

        update_cycle(&mut tx, cycle).await?;

        tx.commit().await.map_err(|e| {
            DomainError::database(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }

    async fn create_successor(
        &self,
        demoted: &PlanCycle,
        successor: &PlanCycle,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to begin transaction: {}", e))
        })?;

        // Demote first: the partial unique index on (recipient_id)
        // WHERE is_latest_cycle rejects a second latest row.
        update_cycle(&mut tx, demoted).await?;
        insert_cycle(&mut tx, successor).await?;

        tx.commit().await.map_err(|e| {
            DomainError::database(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &CycleId) -> Result<Option<PlanCycle>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, recipient_id, cycle_number, start_date,
                   renewal_deadline, next_cycle_lead_days, is_latest_cycle,
                   created_at, updated_at
            FROM plan_cycles WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch cycle: {}", e)))?;

        match row {
            Some(row) => Ok(Some(self.load_aggregate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_successors(
        &self,
        recipient_id: &RecipientId,
        above_cycle_number: u32,
    ) -> Result<Vec<PlanCycle>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, recipient_id, cycle_number, start_date,
                   renewal_deadline, next_cycle_lead_days, is_latest_cycle,
                   created_at, updated_at
            FROM plan_cycles
            WHERE recipient_id = $1 AND cycle_number > $2
            ORDER BY cycle_number ASC
            "#,
        )
        .bind(recipient_id.as_uuid())
        .bind(above_cycle_number as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch successor cycles: {}", e)))?;

        let mut cycles = Vec::with_capacity(rows.len());
        for row in rows {
            cycles.push(self.load_aggregate(row).await?);
        }
        Ok(cycles)
    }

    async fn find_highest(
        &self,
        recipient_id: &RecipientId,
    ) -> Result<Option<PlanCycle>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, recipient_id, cycle_number, start_date,
                   renewal_deadline, next_cycle_lead_days, is_latest_cycle,
                   created_at, updated_at
            FROM plan_cycles
            WHERE recipient_id = $1
            ORDER BY cycle_number DESC
            LIMIT 1
            "#,
        )
        .bind(recipient_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch highest cycle: {}", e)))?;

        match row {
            Some(row) => Ok(Some(self.load_aggregate(row).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &CycleId) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to begin transaction: {}", e))
        })?;

        // Child rows first: deliverables and statuses, then the cycle.
        sqlx::query("DELETE FROM deliverables WHERE cycle_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete deliverables: {}", e)))?;

        sqlx::query("DELETE FROM step_statuses WHERE cycle_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete statuses: {}", e)))?;

        let result = sqlx::query("DELETE FROM plan_cycles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete cycle: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CycleNotFound,
                format!("Cycle not found: {}", id),
            ));
        }

        tx.commit().await.map_err(|e| {
            DomainError::database(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Helper Functions
// ════════════════════════════════════════════════════════════════════════════════

async fn insert_cycle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cycle: &PlanCycle,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO plan_cycles (
            id, tenant_id, recipient_id, cycle_number, start_date,
            renewal_deadline, next_cycle_lead_days, is_latest_cycle,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(cycle.id().as_uuid())
    .bind(cycle.tenant_id().as_uuid())
    .bind(cycle.recipient_id().as_uuid())
    .bind(cycle.cycle_number() as i32)
    .bind(cycle.start_date().map(|d| *d.as_naive()))
    .bind(cycle.renewal_deadline().map(|d| *d.as_naive()))
    .bind(cycle.next_cycle_lead_days())
    .bind(cycle.is_latest_cycle())
    .bind(cycle.created_at().as_datetime())
    .bind(cycle.updated_at().as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| DomainError::database(format!("Failed to insert cycle: {}", e)))?;

    for status in cycle.statuses() {
        insert_status(tx, status).await?;
    }
    Ok(())
}

async fn update_cycle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cycle: &PlanCycle,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE plan_cycles SET
            start_date = $2,
            renewal_deadline = $3,
            next_cycle_lead_days = $4,
            is_latest_cycle = $5,
            updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(cycle.id().as_uuid())
    .bind(cycle.start_date().map(|d| *d.as_naive()))
    .bind(cycle.renewal_deadline().map(|d| *d.as_naive()))
    .bind(cycle.next_cycle_lead_days())
    .bind(cycle.is_latest_cycle())
    .bind(cycle.updated_at().as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| DomainError::database(format!("Failed to update cycle: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::CycleNotFound,
            format!("Cycle not found: {}", cycle.id()),
        ));
    }

    for status in cycle.statuses() {
        update_status(tx, status).await?;
    }
    Ok(())
}

async fn insert_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    status: &StepStatus,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO step_statuses (
            id, cycle_id, kind, completed, completed_at, completed_by,
            due_date, is_latest
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(status.id().as_uuid())
    .bind(status.cycle_id().as_uuid())
    .bind(status.kind().as_str())
    .bind(status.is_completed())
    .bind(status.completed_at().map(|t| *t.as_datetime()))
    .bind(status.completed_by().map(|id| *id.as_uuid()))
    .bind(status.due_date().map(|d| *d.as_naive()))
    .bind(status.is_latest())
    .execute(&mut **tx)
    .await
    .map_err(|e| DomainError::database(format!("Failed to insert status: {}", e)))?;
    Ok(())
}

async fn update_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    status: &StepStatus,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE step_statuses SET
            completed = $2,
            completed_at = $3,
            completed_by = $4,
            due_date = $5,
            is_latest = $6
        WHERE id = $1
        "#,
    )
    .bind(status.id().as_uuid())
    .bind(status.is_completed())
    .bind(status.completed_at().map(|t| *t.as_datetime()))
    .bind(status.completed_by().map(|id| *id.as_uuid()))
    .bind(status.due_date().map(|d| *d.as_naive()))
    .bind(status.is_latest())
    .execute(&mut **tx)
    .await
    .map_err(|e| DomainError::database(format!("Failed to update status: {}", e)))?;
    Ok(())
}

async fn load_statuses(pool: &PgPool, cycle_id: &CycleId) -> Result<Vec<StepStatus>, DomainError> {
    let rows = sqlx::query(
        r#"
        SELECT id, cycle_id, kind, completed, completed_at, completed_by,
               due_date, is_latest
        FROM step_statuses WHERE cycle_id = $1
        "#,
    )
    .bind(cycle_id.as_uuid())
    .fetch_all(pool)
    .await
    .map_err(|e| DomainError::database(format!("Failed to fetch statuses: {}", e)))?;

    let mut statuses = Vec::with_capacity(rows.len());
    for row in rows {
        statuses.push(row_to_status(row)?);
    }
    // Canonical step order, independent of insertion order.
    statuses.sort_by_key(|s| s.kind().order_index());
    Ok(statuses)
}

fn row_to_cycle(
    row: sqlx::postgres::PgRow,
    statuses: Vec<StepStatus>,
) -> Result<PlanCycle, DomainError> {
    let id: Uuid = row.get("id");
    let tenant_id: Uuid = row.get("tenant_id");
    let recipient_id: Uuid = row.get("recipient_id");
    let cycle_number: i32 = row.get("cycle_number");
    let start_date: Option<NaiveDate> = row.get("start_date");
    let renewal_deadline: Option<NaiveDate> = row.get("renewal_deadline");
    let next_cycle_lead_days: i64 = row.get("next_cycle_lead_days");
    let is_latest_cycle: bool = row.get("is_latest_cycle");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(PlanCycle::from_parts(
        CycleId::from_uuid(id),
        TenantId::from_uuid(tenant_id),
        RecipientId::from_uuid(recipient_id),
        cycle_number as u32,
        start_date.map(CalendarDate::from_naive),
        renewal_deadline.map(CalendarDate::from_naive),
        next_cycle_lead_days,
        is_latest_cycle,
        statuses,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

fn row_to_status(row: sqlx::postgres::PgRow) -> Result<StepStatus, DomainError> {
    let id: Uuid = row.get("id");
    let cycle_id: Uuid = row.get("cycle_id");
    let kind: String = row.get("kind");
    let completed: bool = row.get("completed");
    let completed_at: Option<chrono::DateTime<chrono::Utc>> = row.get("completed_at");
    let completed_by: Option<Uuid> = row.get("completed_by");
    let due_date: Option<NaiveDate> = row.get("due_date");
    let is_latest: bool = row.get("is_latest");

    Ok(StepStatus::from_parts(
        StatusId::from_uuid(id),
        CycleId::from_uuid(cycle_id),
        str_to_step_kind(&kind)?,
        completed,
        completed_at.map(Timestamp::from_datetime),
        completed_by.map(StaffId::from_uuid),
        due_date.map(CalendarDate::from_naive),
        is_latest,
    ))
}

fn str_to_step_kind(s: &str) -> Result<StepKind, DomainError> {
    StepKind::all()
        .iter()
        .find(|k| k.as_str() == s)
        .copied()
        .ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Unknown step kind in storage: {}", s),
            )
        })
}
