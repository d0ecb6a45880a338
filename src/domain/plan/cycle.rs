//! PlanCycle aggregate - one ~180-day support plan iteration.
//!
//! The aggregate owns its five step statuses and the progression cursor.
//! All step-order validation lives here; handlers orchestrate persistence
//! and side effects around these methods.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CalendarDate, CycleId, DomainError, ErrorCode, RecipientId, StaffId, StatusId, StepKind,
    TenantId, Timestamp,
};

use super::status::StepStatus;

/// Days from cycle start to the renewal deadline.
pub const RENEWAL_HORIZON_DAYS: i64 = 180;

/// Default lead time between terminal-step completion and the next
/// cycle's monitoring due date.
pub const DEFAULT_NEXT_CYCLE_LEAD_DAYS: i64 = 7;

/// Outcome of recording a step completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCompletion {
    /// The cursor advanced to the next step in order.
    Advanced {
        status_id: StatusId,
        next: StepKind,
        completed_at: Timestamp,
    },
    /// The terminal step completed; the cursor stays on it pending
    /// rollover into the successor cycle.
    TerminalReached {
        status_id: StatusId,
        completed_at: Timestamp,
    },
}

impl StepCompletion {
    /// The id of the status that was completed.
    pub fn status_id(&self) -> StatusId {
        match self {
            StepCompletion::Advanced { status_id, .. } => *status_id,
            StepCompletion::TerminalReached { status_id, .. } => *status_id,
        }
    }

    /// When the step was completed.
    pub fn completed_at(&self) -> Timestamp {
        match self {
            StepCompletion::Advanced { completed_at, .. } => *completed_at,
            StepCompletion::TerminalReached { completed_at, .. } => *completed_at,
        }
    }
}

/// One iteration of the support plan for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCycle {
    id: CycleId,
    tenant_id: TenantId,
    recipient_id: RecipientId,
    cycle_number: u32,
    start_date: Option<CalendarDate>,
    renewal_deadline: Option<CalendarDate>,
    next_cycle_lead_days: i64,
    is_latest_cycle: bool,
    statuses: Vec<StepStatus>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl PlanCycle {
    /// Creates the first cycle for a recipient.
    ///
    /// The start date is left unset; the first completed assessment (or
    /// monitoring) deliverable sets the clock.
    pub fn first(tenant_id: TenantId, recipient_id: RecipientId) -> Self {
        let id = CycleId::new();
        Self {
            id,
            tenant_id,
            recipient_id,
            cycle_number: 1,
            start_date: None,
            renewal_deadline: None,
            next_cycle_lead_days: DEFAULT_NEXT_CYCLE_LEAD_DAYS,
            is_latest_cycle: true,
            statuses: Self::fresh_statuses(id, None),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    /// Creates the successor of a completed cycle.
    ///
    /// The successor starts today with a renewal deadline 180 days out;
    /// its monitoring due date is the predecessor's terminal completion
    /// plus the predecessor's lead days, for display only.
    pub fn successor_of(
        predecessor: &PlanCycle,
        today: CalendarDate,
        terminal_completed_at: Timestamp,
    ) -> Self {
        let id = CycleId::new();
        let monitoring_due = terminal_completed_at
            .date()
            .plus_days(predecessor.next_cycle_lead_days);
        Self {
            id,
            tenant_id: predecessor.tenant_id,
            recipient_id: predecessor.recipient_id,
            cycle_number: predecessor.cycle_number + 1,
            start_date: Some(today),
            renewal_deadline: Some(today.plus_days(RENEWAL_HORIZON_DAYS)),
            next_cycle_lead_days: DEFAULT_NEXT_CYCLE_LEAD_DAYS,
            is_latest_cycle: true,
            statuses: Self::fresh_statuses(id, Some(monitoring_due)),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    /// Reconstructs a cycle from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CycleId,
        tenant_id: TenantId,
        recipient_id: RecipientId,
        cycle_number: u32,
        start_date: Option<CalendarDate>,
        renewal_deadline: Option<CalendarDate>,
        next_cycle_lead_days: i64,
        is_latest_cycle: bool,
        statuses: Vec<StepStatus>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            tenant_id,
            recipient_id,
            cycle_number,
            start_date,
            renewal_deadline,
            next_cycle_lead_days,
            is_latest_cycle,
            statuses,
            created_at,
            updated_at,
        }
    }

    fn fresh_statuses(cycle_id: CycleId, monitoring_due: Option<CalendarDate>) -> Vec<StepStatus> {
        StepKind::all()
            .iter()
            .map(|kind| {
                let mut status =
                    StepStatus::new(cycle_id, *kind, *kind == StepKind::Assessment);
                if *kind == StepKind::Monitoring {
                    status.set_due_date(monitoring_due);
                }
                status
            })
            .collect()
    }

    pub fn id(&self) -> CycleId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn recipient_id(&self) -> RecipientId {
        self.recipient_id
    }

    pub fn cycle_number(&self) -> u32 {
        self.cycle_number
    }

    pub fn start_date(&self) -> Option<CalendarDate> {
        self.start_date
    }

    pub fn renewal_deadline(&self) -> Option<CalendarDate> {
        self.renewal_deadline
    }

    pub fn next_cycle_lead_days(&self) -> i64 {
        self.next_cycle_lead_days
    }

    pub fn is_latest_cycle(&self) -> bool {
        self.is_latest_cycle
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the status holding the progression cursor, if any.
    pub fn latest_status(&self) -> Option<&StepStatus> {
        self.statuses.iter().find(|s| s.is_latest())
    }

    /// Returns the status for a given step.
    pub fn status(&self, kind: StepKind) -> Option<&StepStatus> {
        self.statuses.iter().find(|s| s.kind() == kind)
    }

    /// Flips the latest-cycle flag.
    pub fn set_latest_cycle(&mut self, latest: bool) {
        self.is_latest_cycle = latest;
        self.touch();
    }

    /// Records a completed deliverable upload for a step.
    ///
    /// Fails with `StatusNotFound` when the cycle has no cursor and with
    /// `StepOrderViolation` when the step is not the current latest step.
    /// On the terminal step the cursor stays in place; the caller hands
    /// off to the rollover manager.
    pub fn record_step(
        &mut self,
        kind: StepKind,
        by: StaffId,
        now: Timestamp,
        today: CalendarDate,
    ) -> Result<StepCompletion, DomainError> {
        let current = self
            .latest_status()
            .map(|s| s.kind())
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::StatusNotFound,
                    format!("Cycle {} has no latest status", self.id),
                )
            })?;

        if current != kind {
            return Err(DomainError::new(
                ErrorCode::StepOrderViolation,
                format!(
                    "Current step is {}; a {} deliverable cannot be recorded",
                    current.as_str(),
                    kind.as_str()
                ),
            )
            .with_detail("current", current.as_str())
            .with_detail("attempted", kind.as_str()));
        }

        // First-achiever-sets-the-clock: assessment or monitoring starts
        // the cycle clock when no start date exists yet.
        if self.start_date.is_none()
            && matches!(kind, StepKind::Assessment | StepKind::Monitoring)
        {
            self.start_date = Some(today);
            self.renewal_deadline = Some(today.plus_days(RENEWAL_HORIZON_DAYS));
        }

        let status = self
            .status_mut(kind)
            .expect("latest status kind must exist in the status set");
        status.mark_completed(now, by);
        let status_id = status.id();

        let completion = if kind.is_terminal() {
            StepCompletion::TerminalReached {
                status_id,
                completed_at: now,
            }
        } else {
            let next = kind.next().expect("non-terminal step has a successor");
            self.move_cursor(kind, next);
            StepCompletion::Advanced {
                status_id,
                next,
                completed_at: now,
            }
        };

        self.touch();
        Ok(completion)
    }

    /// Reverts a step completion after its deliverable was deleted.
    ///
    /// Restores the step as the cursor and un-latests every later step.
    /// Reverting the monitoring step does not remove any successor cycle
    /// created by an earlier rollover.
    pub fn revert_step(&mut self, kind: StepKind) -> Result<(), DomainError> {
        if self.status(kind).is_none() {
            return Err(DomainError::new(
                ErrorCode::StatusNotFound,
                format!("Cycle {} has no status for step {}", self.id, kind.as_str()),
            ));
        }

        for status in &mut self.statuses {
            if status.kind() == kind {
                status.reset_completion();
                status.set_latest(true);
            } else if status.kind().is_after(&kind) {
                status.set_latest(false);
            }
        }

        self.touch();
        Ok(())
    }

    /// Updates the next-cycle lead days and shifts the monitoring due
    /// date by the same delta.
    ///
    /// Returns the recomputed due date when the monitoring status had
    /// one.
    pub fn set_next_cycle_lead_days(
        &mut self,
        lead_days: i64,
    ) -> Result<Option<CalendarDate>, DomainError> {
        if lead_days < 0 {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Lead days must not be negative, got {}", lead_days),
            ));
        }

        let delta = lead_days - self.next_cycle_lead_days;
        self.next_cycle_lead_days = lead_days;

        let cycle_id = self.id;
        let status = self
            .status_mut(StepKind::Monitoring)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::StatusNotFound,
                    format!("Cycle {} has no monitoring status", cycle_id),
                )
            })?;

        let new_due = status.due_date().map(|due| due.plus_days(delta));
        status.set_due_date(new_due);
        self.touch();
        Ok(new_due)
    }

    fn status_mut(&mut self, kind: StepKind) -> Option<&mut StepStatus> {
        self.statuses.iter_mut().find(|s| s.kind() == kind)
    }

    fn move_cursor(&mut self, from: StepKind, to: StepKind) {
        for status in &mut self.statuses {
            if status.kind() == from {
                status.set_latest(false);
            } else if status.kind() == to {
                status.set_latest(true);
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn today() -> CalendarDate {
        CalendarDate::from_ymd(2024, 4, 1).unwrap()
    }

    fn record(cycle: &mut PlanCycle, kind: StepKind) -> Result<StepCompletion, DomainError> {
        cycle.record_step(kind, StaffId::new(), Timestamp::now(), today())
    }

    fn latest_count(cycle: &PlanCycle) -> usize {
        cycle.statuses().iter().filter(|s| s.is_latest()).count()
    }

    #[test]
    fn first_cycle_starts_with_assessment_cursor_and_no_clock() {
        let cycle = PlanCycle::first(TenantId::new(), RecipientId::new());

        assert_eq!(cycle.cycle_number(), 1);
        assert!(cycle.is_latest_cycle());
        assert!(cycle.start_date().is_none());
        assert!(cycle.renewal_deadline().is_none());
        assert_eq!(cycle.statuses().len(), 5);
        assert_eq!(
            cycle.latest_status().map(|s| s.kind()),
            Some(StepKind::Assessment)
        );
        assert_eq!(latest_count(&cycle), 1);
    }

    #[test]
    fn recording_assessment_sets_the_clock() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());

        record(&mut cycle, StepKind::Assessment).unwrap();

        assert_eq!(cycle.start_date(), Some(today()));
        assert_eq!(cycle.renewal_deadline(), Some(today().plus_days(180)));
    }

    #[test]
    fn recording_non_clock_step_leaves_clock_unset() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        record(&mut cycle, StepKind::Assessment).unwrap();

        // Clear the clock to simulate a draft-plan-first cycle shape.
        let mut bare = PlanCycle::from_parts(
            cycle.id(),
            cycle.tenant_id(),
            cycle.recipient_id(),
            1,
            None,
            None,
            DEFAULT_NEXT_CYCLE_LEAD_DAYS,
            true,
            cycle.statuses().to_vec(),
            cycle.created_at(),
            cycle.updated_at(),
        );
        record(&mut bare, StepKind::DraftPlan).unwrap();

        assert!(bare.start_date().is_none());
        assert!(bare.renewal_deadline().is_none());
    }

    #[test]
    fn recording_out_of_order_step_fails_with_both_steps_named() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());

        let err = record(&mut cycle, StepKind::StaffMeeting).unwrap_err();

        assert_eq!(err.code, ErrorCode::StepOrderViolation);
        assert_eq!(err.details.get("current").map(String::as_str), Some("assessment"));
        assert_eq!(
            err.details.get("attempted").map(String::as_str),
            Some("staff_meeting")
        );
        // The failed attempt must not complete anything.
        assert!(!cycle.status(StepKind::StaffMeeting).unwrap().is_completed());
    }

    #[test]
    fn recording_advances_cursor_through_all_non_terminal_steps() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());

        for expected_next in [
            StepKind::DraftPlan,
            StepKind::StaffMeeting,
            StepKind::FinalPlanSigned,
            StepKind::Monitoring,
        ] {
            let current = cycle.latest_status().unwrap().kind();
            let completion = record(&mut cycle, current).unwrap();
            match completion {
                StepCompletion::Advanced { next, .. } => assert_eq!(next, expected_next),
                StepCompletion::TerminalReached { .. } => panic!("not terminal yet"),
            }
            assert_eq!(cycle.latest_status().unwrap().kind(), expected_next);
            assert_eq!(latest_count(&cycle), 1);
        }
    }

    #[test]
    fn terminal_step_keeps_cursor_in_place() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        for kind in StepKind::all().iter().take(4) {
            record(&mut cycle, *kind).unwrap();
        }

        let completion = record(&mut cycle, StepKind::Monitoring).unwrap();

        assert!(matches!(completion, StepCompletion::TerminalReached { .. }));
        assert_eq!(
            cycle.latest_status().map(|s| s.kind()),
            Some(StepKind::Monitoring)
        );
        assert!(cycle.status(StepKind::Monitoring).unwrap().is_completed());
    }

    #[test]
    fn revert_restores_cursor_and_unlatests_later_steps() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        record(&mut cycle, StepKind::Assessment).unwrap();
        record(&mut cycle, StepKind::DraftPlan).unwrap();

        cycle.revert_step(StepKind::Assessment).unwrap();

        let assessment = cycle.status(StepKind::Assessment).unwrap();
        assert!(!assessment.is_completed());
        assert!(assessment.completed_at().is_none());
        assert!(assessment.completed_by().is_none());
        assert!(assessment.is_latest());
        assert_eq!(latest_count(&cycle), 1);
    }

    #[test]
    fn successor_numbers_and_clock() {
        let mut predecessor = PlanCycle::first(TenantId::new(), RecipientId::new());
        for kind in StepKind::all() {
            record(&mut predecessor, *kind).unwrap();
        }
        let completed_at = predecessor
            .status(StepKind::Monitoring)
            .unwrap()
            .completed_at()
            .unwrap();

        let rollover_day = CalendarDate::from_ymd(2024, 10, 1).unwrap();
        let successor = PlanCycle::successor_of(&predecessor, rollover_day, completed_at);

        assert_eq!(successor.cycle_number(), 2);
        assert_eq!(successor.tenant_id(), predecessor.tenant_id());
        assert_eq!(successor.recipient_id(), predecessor.recipient_id());
        assert!(successor.is_latest_cycle());
        assert_eq!(successor.start_date(), Some(rollover_day));
        assert_eq!(
            successor.renewal_deadline(),
            Some(rollover_day.plus_days(180))
        );
        assert_eq!(
            successor.latest_status().map(|s| s.kind()),
            Some(StepKind::Assessment)
        );
        assert!(successor.statuses().iter().all(|s| !s.is_completed()));
        assert_eq!(
            successor.status(StepKind::Monitoring).unwrap().due_date(),
            Some(completed_at.date().plus_days(DEFAULT_NEXT_CYCLE_LEAD_DAYS))
        );
    }

    #[test]
    fn lead_days_edit_shifts_monitoring_due_date() {
        let mut predecessor = PlanCycle::first(TenantId::new(), RecipientId::new());
        for kind in StepKind::all() {
            record(&mut predecessor, *kind).unwrap();
        }
        let completed_at = predecessor
            .status(StepKind::Monitoring)
            .unwrap()
            .completed_at()
            .unwrap();
        let mut successor =
            PlanCycle::successor_of(&predecessor, today(), completed_at);
        let original_due = successor.status(StepKind::Monitoring).unwrap().due_date().unwrap();

        let new_due = successor.set_next_cycle_lead_days(14).unwrap();

        assert_eq!(successor.next_cycle_lead_days(), 14);
        assert_eq!(new_due, Some(original_due.plus_days(7)));
    }

    #[test]
    fn lead_days_edit_rejects_negative() {
        let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        let err = cycle.set_next_cycle_lead_days(-1).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn lead_days_edit_without_monitoring_status_names_the_cycle() {
        let cycle = PlanCycle::first(TenantId::new(), RecipientId::new());
        let mut truncated = PlanCycle::from_parts(
            cycle.id(),
            cycle.tenant_id(),
            cycle.recipient_id(),
            1,
            None,
            None,
            DEFAULT_NEXT_CYCLE_LEAD_DAYS,
            true,
            cycle.statuses()[..4].to_vec(),
            cycle.created_at(),
            cycle.updated_at(),
        );

        let err = truncated.set_next_cycle_lead_days(10).unwrap_err();

        assert_eq!(err.code, ErrorCode::StatusNotFound);
        assert!(err.message.contains(&cycle.id().to_string()));
    }

    proptest! {
        /// Any step other than the current cursor is always rejected, and
        /// a rejection never moves the cursor or completes anything.
        #[test]
        fn only_cursor_step_is_recordable(attempts in proptest::collection::vec(0usize..5, 1..20)) {
            let mut cycle = PlanCycle::first(TenantId::new(), RecipientId::new());

            for idx in attempts {
                let attempted = StepKind::all()[idx];
                let current = cycle.latest_status().unwrap().kind();
                let before: Vec<bool> =
                    cycle.statuses().iter().map(|s| s.is_completed()).collect();

                let result = cycle.record_step(
                    attempted,
                    StaffId::new(),
                    Timestamp::now(),
                    today(),
                );

                if attempted == current {
                    prop_assert!(result.is_ok());
                } else {
                    let err = result.unwrap_err();
                    prop_assert_eq!(err.code, ErrorCode::StepOrderViolation);
                    let after: Vec<bool> =
                        cycle.statuses().iter().map(|s| s.is_completed()).collect();
                    prop_assert_eq!(before, after);
                    prop_assert_eq!(cycle.latest_status().unwrap().kind(), current);
                }
                // Cursor invariant: exactly one latest status at all times.
                prop_assert_eq!(
                    cycle.statuses().iter().filter(|s| s.is_latest()).count(),
                    1
                );
            }
        }
    }
}
