//! RevertDeliverableHandler - Command handler for deleting an uploaded
//! document.
//!
//! Deleting a document rolls the cycle's cursor back to the step it
//! backed. A rollover already triggered by a monitoring completion is
//! not reversed; any successor cycle survives the revert.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, CycleId, DeliverableId, DomainError};
use crate::domain::plan::PlanCycle;
use crate::ports::{CycleRepository, DeliverableRepository};

/// Command to revert a recorded deliverable.
#[derive(Debug, Clone)]
pub struct RevertDeliverableCommand {
    /// The deliverable to delete.
    pub deliverable_id: DeliverableId,
}

/// Result of successfully reverting a deliverable.
#[derive(Debug, Clone)]
pub struct RevertDeliverableResult {
    /// The cycle with its cursor rolled back.
    pub cycle: PlanCycle,
}

/// Error type for reverting a deliverable.
#[derive(Debug, Clone)]
pub enum RevertDeliverableError {
    /// Deliverable not found.
    DeliverableNotFound(DeliverableId),
    /// Cycle not found.
    CycleNotFound(CycleId),
    /// Domain error.
    Domain(DomainError),
}

impl std::fmt::Display for RevertDeliverableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertDeliverableError::DeliverableNotFound(id) => {
                write!(f, "Deliverable not found: {}", id)
            }
            RevertDeliverableError::CycleNotFound(id) => write!(f, "Cycle not found: {}", id),
            RevertDeliverableError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RevertDeliverableError {}

impl From<DomainError> for RevertDeliverableError {
    fn from(err: DomainError) -> Self {
        RevertDeliverableError::Domain(err)
    }
}

/// Handler for reverting deliverables.
pub struct RevertDeliverableHandler {
    cycles: Arc<dyn CycleRepository>,
    deliverables: Arc<dyn DeliverableRepository>,
}

impl RevertDeliverableHandler {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        deliverables: Arc<dyn DeliverableRepository>,
    ) -> Self {
        Self {
            cycles,
            deliverables,
        }
    }

    pub async fn handle(
        &self,
        cmd: RevertDeliverableCommand,
        metadata: CommandMetadata,
    ) -> Result<RevertDeliverableResult, RevertDeliverableError> {
        let deliverable = self
            .deliverables
            .find_by_id(&cmd.deliverable_id)
            .await?
            .ok_or(RevertDeliverableError::DeliverableNotFound(
                cmd.deliverable_id,
            ))?;

        let mut cycle = self
            .cycles
            .find_by_id(&deliverable.cycle_id())
            .await?
            .ok_or(RevertDeliverableError::CycleNotFound(deliverable.cycle_id()))?;

        cycle.revert_step(deliverable.kind().step())?;
        self.cycles.update(&cycle).await?;
        self.deliverables.delete(&cmd.deliverable_id).await?;

        tracing::info!(
            cycle_id = %cycle.id(),
            kind = deliverable.kind().as_str(),
            staff_id = %metadata.staff_id,
            "Reverted deliverable"
        );

        Ok(RevertDeliverableResult { cycle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::plan::record_deliverable::tests::InMemoryDeliverableRepository;
    use crate::application::handlers::plan::rollover_cycle::tests::{
        completed_first_cycle, InMemoryCycleRepository,
    };
    use crate::domain::foundation::{
        CalendarDate, DeliverableKind, RecipientId, StaffId, StepKind, TenantId, Timestamp,
    };
    use crate::domain::plan::{ArtifactRef, Deliverable};

    fn deliverable_for(cycle_id: CycleId, kind: DeliverableKind) -> Deliverable {
        Deliverable::new(
            cycle_id,
            kind,
            ArtifactRef::new("s3://plans/doc.pdf"),
            "doc.pdf",
            StaffId::new(),
        )
    }

    #[tokio::test]
    async fn revert_rolls_cursor_back_and_deletes_the_row() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        cycle
            .record_step(
                StepKind::Assessment,
                StaffId::new(),
                Timestamp::now(),
                CalendarDate::today(),
            )
            .unwrap();
        let deliverable = deliverable_for(cycle.id(), DeliverableKind::AssessmentSheet);
        let deliverable_id = deliverable.id();

        let cycles = Arc::new(InMemoryCycleRepository::with_cycles(vec![cycle]));
        let deliverables =
            Arc::new(InMemoryDeliverableRepository::with_deliverable(deliverable));
        let handler = RevertDeliverableHandler::new(cycles.clone(), deliverables.clone());

        let result = handler
            .handle(
                RevertDeliverableCommand { deliverable_id },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();

        let assessment = result.cycle.status(StepKind::Assessment).unwrap();
        assert!(!assessment.is_completed());
        assert!(assessment.is_latest());
        assert!(deliverables.deliverables().is_empty());
        assert_eq!(
            cycles.cycles()[0].latest_status().map(|s| s.kind()),
            Some(StepKind::Assessment)
        );
    }

    #[tokio::test]
    async fn fails_when_deliverable_not_found() {
        let cycles = Arc::new(InMemoryCycleRepository::new());
        let deliverables = Arc::new(InMemoryDeliverableRepository::new());
        let handler = RevertDeliverableHandler::new(cycles, deliverables);

        let err = handler
            .handle(
                RevertDeliverableCommand {
                    deliverable_id: DeliverableId::new(),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RevertDeliverableError::DeliverableNotFound(_)
        ));
    }

    #[tokio::test]
    async fn fails_when_cycle_not_found() {
        let deliverable = deliverable_for(CycleId::new(), DeliverableKind::AssessmentSheet);
        let deliverable_id = deliverable.id();
        let cycles = Arc::new(InMemoryCycleRepository::new());
        let deliverables =
            Arc::new(InMemoryDeliverableRepository::with_deliverable(deliverable));
        let handler = RevertDeliverableHandler::new(cycles, deliverables);

        let err = handler
            .handle(
                RevertDeliverableCommand { deliverable_id },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RevertDeliverableError::CycleNotFound(_)));
    }

    #[tokio::test]
    async fn reverting_monitoring_leaves_successor_cycle_in_place() {
        // Known gap: the successor created by the earlier rollover is
        // orphaned, not deleted.
        let mut cycle1 = completed_first_cycle();
        let completed_at = cycle1
            .status(StepKind::Monitoring)
            .unwrap()
            .completed_at()
            .unwrap();
        let cycle2 = PlanCycle::successor_of(&cycle1, CalendarDate::today(), completed_at);
        cycle1.set_latest_cycle(false);
        let cycle2_id = cycle2.id();

        let deliverable = deliverable_for(cycle1.id(), DeliverableKind::MonitoringReportPdf);
        let deliverable_id = deliverable.id();
        let cycles = Arc::new(InMemoryCycleRepository::with_cycles(vec![cycle1, cycle2]));
        let deliverables =
            Arc::new(InMemoryDeliverableRepository::with_deliverable(deliverable));
        let handler = RevertDeliverableHandler::new(cycles.clone(), deliverables);

        handler
            .handle(
                RevertDeliverableCommand { deliverable_id },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();

        let stored = cycles.cycles();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|c| c.id() == cycle2_id));
    }
}
