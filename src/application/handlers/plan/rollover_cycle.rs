//! CycleRolloverManager - spins up the successor cycle when the
//! terminal step completes.
//!
//! Persistence of the new cycle is all-or-nothing and failures abort the
//! operation. Reminder scheduling afterwards is best-effort: outcomes
//! are logged and never unwind the rollover.

use std::sync::Arc;

use crate::domain::foundation::{CalendarDate, DomainError, StepKind, Timestamp};
use crate::domain::plan::{PlanCycle, ReminderKind};
use crate::ports::CycleRepository;

use super::super::calendar::{ReminderScheduler, ScheduleOutcome};

/// Reacts to terminal-step completion by closing the current cycle and
/// creating its successor.
pub struct CycleRolloverManager {
    cycles: Arc<dyn CycleRepository>,
    scheduler: Arc<ReminderScheduler>,
}

impl CycleRolloverManager {
    pub fn new(cycles: Arc<dyn CycleRepository>, scheduler: Arc<ReminderScheduler>) -> Self {
        Self { cycles, scheduler }
    }

    /// Rolls the recipient over into a fresh cycle.
    ///
    /// Deletes any stale successor cycles left behind by an earlier
    /// rollover, demotes the completed cycle, and creates exactly one
    /// successor with five fresh statuses.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` when deleting stale successors or persisting the
    ///   demotion/creation fails
    pub async fn on_monitoring_completed(
        &self,
        cycle: &mut PlanCycle,
        completed_at: Timestamp,
    ) -> Result<PlanCycle, DomainError> {
        self.reset_stale_successors(cycle).await?;

        cycle.set_latest_cycle(false);
        let successor = PlanCycle::successor_of(cycle, CalendarDate::today(), completed_at);

        // Demotion and successor creation move as one unit: a partial
        // write would leave the recipient with no latest cycle.
        if let Err(err) = self.cycles.create_successor(cycle, &successor).await {
            cycle.set_latest_cycle(true);
            return Err(err);
        }

        tracing::info!(
            recipient_id = %successor.recipient_id(),
            predecessor = cycle.cycle_number(),
            cycle_number = successor.cycle_number(),
            "Rolled over into successor cycle"
        );

        self.schedule_windows(&successor).await;
        Ok(successor)
    }

    /// Removes successor cycles orphaned by a monitoring re-upload on an
    /// older cycle, then re-flags the highest survivor as latest.
    async fn reset_stale_successors(&self, cycle: &PlanCycle) -> Result<(), DomainError> {
        let stale = self
            .cycles
            .find_successors(&cycle.recipient_id(), cycle.cycle_number())
            .await?;
        if stale.is_empty() {
            return Ok(());
        }

        // Highest-numbered first, so a failure mid-way never leaves a gap
        // below a surviving cycle.
        for stale_cycle in stale.iter().rev() {
            self.retract_reminders(stale_cycle).await;
            self.cycles.delete(&stale_cycle.id()).await?;
            tracing::warn!(
                recipient_id = %cycle.recipient_id(),
                cycle_number = stale_cycle.cycle_number(),
                "Deleted stale successor cycle before rollover"
            );
        }

        // Consistency backstop: the highest remaining cycle carries the
        // latest flag until the successor is created.
        if let Some(mut highest) = self.cycles.find_highest(&cycle.recipient_id()).await? {
            if !highest.is_latest_cycle() {
                highest.set_latest_cycle(true);
                self.cycles.update(&highest).await?;
            }
        }
        Ok(())
    }

    async fn retract_reminders(&self, stale_cycle: &PlanCycle) {
        if let Err(err) = self
            .scheduler
            .retract_by_cycle(stale_cycle.id(), ReminderKind::RenewalDeadline)
            .await
        {
            tracing::warn!(
                cycle_id = %stale_cycle.id(),
                error = %err,
                "Failed to retract renewal reminder of stale cycle"
            );
        }
        if let Some(monitoring) = stale_cycle.status(StepKind::Monitoring) {
            if let Err(err) = self
                .scheduler
                .retract_by_status(monitoring.id(), ReminderKind::NextCycleStart)
                .await
            {
                tracing::warn!(
                    status_id = %monitoring.id(),
                    error = %err,
                    "Failed to retract next-cycle reminder of stale cycle"
                );
            }
        }
    }

    async fn schedule_windows(&self, successor: &PlanCycle) {
        match self.scheduler.schedule_renewal_window(successor).await {
            Ok(ScheduleOutcome::Scheduled(event)) => {
                tracing::info!(
                    cycle_id = %successor.id(),
                    event_id = %event.id(),
                    "Scheduled renewal-deadline window"
                );
            }
            Ok(outcome) => {
                tracing::info!(
                    cycle_id = %successor.id(),
                    ?outcome,
                    "Renewal-deadline window not scheduled"
                );
            }
            Err(err) => {
                tracing::warn!(
                    cycle_id = %successor.id(),
                    error = %err,
                    "Failed to schedule renewal-deadline window"
                );
            }
        }

        let Some(monitoring) = successor.status(StepKind::Monitoring) else {
            return;
        };
        match self
            .scheduler
            .schedule_next_cycle_window(successor, monitoring.id())
            .await
        {
            Ok(ScheduleOutcome::Scheduled(event)) => {
                tracing::info!(
                    cycle_id = %successor.id(),
                    event_id = %event.id(),
                    "Scheduled next-cycle-start window"
                );
            }
            Ok(outcome) => {
                tracing::info!(
                    cycle_id = %successor.id(),
                    ?outcome,
                    "Next-cycle-start window not scheduled"
                );
            }
            Err(err) => {
                tracing::warn!(
                    cycle_id = %successor.id(),
                    error = %err,
                    "Failed to schedule next-cycle-start window"
                );
            }
        }
    }
}
