//! SetMonitoringLeadHandler - operator edit of the next-cycle lead time.
//!
//! Changing the lead days shifts the cycle's monitoring due date by the
//! same delta and, best-effort, plans a precise single-day reminder
//! window at the new date.

use std::sync::Arc;

use crate::domain::foundation::{
    CalendarDate, CommandMetadata, CycleId, DomainError, StepKind,
};
use crate::domain::plan::PlanCycle;
use crate::ports::CycleRepository;

use super::super::calendar::{ReminderScheduler, ScheduleOutcome};

/// Command to change a cycle's next-cycle lead days.
#[derive(Debug, Clone)]
pub struct SetMonitoringLeadCommand {
    /// The cycle to update.
    pub cycle_id: CycleId,
    /// The new lead time in days; must not be negative.
    pub lead_days: i64,
}

/// Result of successfully updating the lead time.
#[derive(Debug, Clone)]
pub struct SetMonitoringLeadResult {
    /// The updated cycle.
    pub cycle: PlanCycle,
    /// The recomputed monitoring due date, when one was set.
    pub monitoring_due: Option<CalendarDate>,
}

/// Error type for updating the lead time.
#[derive(Debug, Clone)]
pub enum SetMonitoringLeadError {
    /// Cycle not found.
    CycleNotFound(CycleId),
    /// Domain error (negative lead days, persistence).
    Domain(DomainError),
}

impl std::fmt::Display for SetMonitoringLeadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetMonitoringLeadError::CycleNotFound(id) => write!(f, "Cycle not found: {}", id),
            SetMonitoringLeadError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SetMonitoringLeadError {}

impl From<DomainError> for SetMonitoringLeadError {
    fn from(err: DomainError) -> Self {
        SetMonitoringLeadError::Domain(err)
    }
}

/// Handler for lead-time edits.
pub struct SetMonitoringLeadHandler {
    cycles: Arc<dyn CycleRepository>,
    scheduler: Arc<ReminderScheduler>,
}

impl SetMonitoringLeadHandler {
    pub fn new(cycles: Arc<dyn CycleRepository>, scheduler: Arc<ReminderScheduler>) -> Self {
        Self { cycles, scheduler }
    }

    pub async fn handle(
        &self,
        cmd: SetMonitoringLeadCommand,
        metadata: CommandMetadata,
    ) -> Result<SetMonitoringLeadResult, SetMonitoringLeadError> {
        let mut cycle = self
            .cycles
            .find_by_id(&cmd.cycle_id)
            .await?
            .ok_or(SetMonitoringLeadError::CycleNotFound(cmd.cycle_id))?;

        let monitoring_due = cycle.set_next_cycle_lead_days(cmd.lead_days)?;
        self.cycles.update(&cycle).await?;

        tracing::info!(
            cycle_id = %cycle.id(),
            lead_days = cmd.lead_days,
            staff_id = %metadata.staff_id,
            "Updated next-cycle lead days"
        );

        if let Some(due) = monitoring_due {
            self.schedule_precise_window(&cycle, due).await;
        }

        Ok(SetMonitoringLeadResult {
            cycle,
            monitoring_due,
        })
    }

    /// Best-effort; an existing window for the status wins.
    async fn schedule_precise_window(&self, cycle: &PlanCycle, due: CalendarDate) {
        let Some(monitoring) = cycle.status(StepKind::Monitoring) else {
            return;
        };
        match self
            .scheduler
            .schedule_precise_deadline(cycle, monitoring.id(), due)
            .await
        {
            Ok(ScheduleOutcome::Scheduled(event)) => {
                tracing::info!(
                    cycle_id = %cycle.id(),
                    event_id = %event.id(),
                    due = %due,
                    "Scheduled precise next-cycle window"
                );
            }
            Ok(outcome) => {
                tracing::info!(
                    cycle_id = %cycle.id(),
                    ?outcome,
                    "Precise next-cycle window not scheduled"
                );
            }
            Err(err) => {
                tracing::warn!(
                    cycle_id = %cycle.id(),
                    error = %err,
                    "Failed to schedule precise next-cycle window"
                );
            }
        }
    }
}
