//! RecordDeliverableHandler - Command handler for a document upload.
//!
//! The upload drives the step state machine: recording the deliverable
//! for the cycle's current step completes that step and advances the
//! cursor. A re-upload for an already-recorded step replaces the stored
//! artifact without touching the state machine. Completing the terminal
//! step hands off to the rollover manager.

use std::sync::Arc;

use crate::domain::foundation::{
    CommandMetadata, CycleId, DomainError, ErrorCode, Timestamp,
};
use crate::domain::foundation::{CalendarDate, DeliverableKind, StepKind};
use crate::domain::plan::{ArtifactRef, Deliverable, PlanCycle, ReminderKind, StepCompletion};
use crate::ports::{CycleRepository, DeliverableRepository};

use super::super::calendar::ReminderScheduler;
use super::rollover_cycle::CycleRolloverManager;

/// Command to record an uploaded deliverable for a cycle.
#[derive(Debug, Clone)]
pub struct RecordDeliverableCommand {
    /// The cycle the document belongs to.
    pub cycle_id: CycleId,
    /// Raw deliverable kind as submitted by the caller.
    pub kind: String,
    /// Reference to the stored artifact.
    pub artifact: ArtifactRef,
    /// The uploader's original filename.
    pub original_filename: String,
}

/// Result of successfully recording a deliverable.
#[derive(Debug, Clone)]
pub struct RecordDeliverableResult {
    /// The persisted (or replaced) deliverable.
    pub deliverable: Deliverable,
    /// The cycle after the upload.
    pub cycle: PlanCycle,
    /// The successor cycle, when the upload completed the terminal step.
    pub successor: Option<PlanCycle>,
    /// Whether this upload replaced an existing artifact.
    pub replaced: bool,
}

/// Error type for recording a deliverable.
#[derive(Debug, Clone)]
pub enum RecordDeliverableError {
    /// Cycle not found.
    CycleNotFound(CycleId),
    /// Domain error (unknown kind, step order violation, persistence).
    Domain(DomainError),
}

impl std::fmt::Display for RecordDeliverableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordDeliverableError::CycleNotFound(id) => write!(f, "Cycle not found: {}", id),
            RecordDeliverableError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RecordDeliverableError {}

impl From<DomainError> for RecordDeliverableError {
    fn from(err: DomainError) -> Self {
        RecordDeliverableError::Domain(err)
    }
}

/// Handler for recording deliverables.
pub struct RecordDeliverableHandler {
    cycles: Arc<dyn CycleRepository>,
    deliverables: Arc<dyn DeliverableRepository>,
    scheduler: Arc<ReminderScheduler>,
    rollover: Arc<CycleRolloverManager>,
}

impl RecordDeliverableHandler {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        deliverables: Arc<dyn DeliverableRepository>,
        scheduler: Arc<ReminderScheduler>,
        rollover: Arc<CycleRolloverManager>,
    ) -> Self {
        Self {
            cycles,
            deliverables,
            scheduler,
            rollover,
        }
    }

    pub async fn handle(
        &self,
        cmd: RecordDeliverableCommand,
        metadata: CommandMetadata,
    ) -> Result<RecordDeliverableResult, RecordDeliverableError> {
        let kind: DeliverableKind = cmd.kind.parse()?;

        // Re-upload check comes before any state-machine validation: a
        // completed step's document can be replaced at any time.
        if let Some(mut existing) = self
            .deliverables
            .find_by_cycle_and_kind(&cmd.cycle_id, kind)
            .await?
        {
            existing.replace_artifact(
                cmd.artifact,
                cmd.original_filename,
                metadata.staff_id,
            );
            self.deliverables.update(&existing).await?;

            let cycle = self
                .cycles
                .find_by_id(&cmd.cycle_id)
                .await?
                .ok_or(RecordDeliverableError::CycleNotFound(cmd.cycle_id))?;

            tracing::info!(
                cycle_id = %cmd.cycle_id,
                kind = kind.as_str(),
                "Replaced deliverable artifact"
            );
            return Ok(RecordDeliverableResult {
                deliverable: existing,
                cycle,
                successor: None,
                replaced: true,
            });
        }

        let mut cycle = self
            .cycles
            .find_by_id(&cmd.cycle_id)
            .await?
            .ok_or(RecordDeliverableError::CycleNotFound(cmd.cycle_id))?;

        let completion =
            cycle.record_step(kind.step(), metadata.staff_id, Timestamp::now(), CalendarDate::today())?;
        self.cycles.update(&cycle).await?;

        let deliverable = Deliverable::new(
            cmd.cycle_id,
            kind,
            cmd.artifact,
            cmd.original_filename,
            metadata.staff_id,
        );
        self.deliverables.save(&deliverable).await?;

        tracing::info!(
            cycle_id = %cmd.cycle_id,
            kind = kind.as_str(),
            staff_id = %metadata.staff_id,
            "Recorded deliverable"
        );

        let successor = self
            .apply_completion_side_effects(&mut cycle, kind.step(), completion)
            .await?;

        Ok(RecordDeliverableResult {
            deliverable,
            cycle,
            successor,
            replaced: false,
        })
    }

    /// Retraction is best-effort; the rollover itself is authoritative
    /// and its persistence failures propagate.
    async fn apply_completion_side_effects(
        &self,
        cycle: &mut PlanCycle,
        step: StepKind,
        completion: StepCompletion,
    ) -> Result<Option<PlanCycle>, RecordDeliverableError> {
        match step {
            StepKind::FinalPlanSigned => {
                if let Err(err) = self
                    .scheduler
                    .retract_by_cycle(cycle.id(), ReminderKind::RenewalDeadline)
                    .await
                {
                    tracing::warn!(
                        cycle_id = %cycle.id(),
                        error = %err,
                        "Failed to retract renewal-deadline reminder"
                    );
                }
                Ok(None)
            }
            StepKind::Monitoring => {
                if let Err(err) = self
                    .scheduler
                    .retract_by_status(completion.status_id(), ReminderKind::NextCycleStart)
                    .await
                {
                    tracing::warn!(
                        status_id = %completion.status_id(),
                        error = %err,
                        "Failed to retract next-cycle-start reminder"
                    );
                }

                let successor = self
                    .rollover
                    .on_monitoring_completed(cycle, completion.completed_at())
                    .await
                    .map_err(|err| {
                        DomainError::new(
                            ErrorCode::InternalError,
                            format!("Cycle rollover failed: {}", err.message),
                        )
                    })?;
                Ok(Some(successor))
            }
            _ => Ok(None),
        }
    }
}
