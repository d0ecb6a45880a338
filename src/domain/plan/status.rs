//! StepStatus entity - one row per step per cycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CalendarDate, CycleId, StaffId, StatusId, StepKind, Timestamp};

/// Progress record for one step of one cycle.
///
/// Exactly one status per cycle carries `is_latest = true`; that flag is
/// the progression cursor, owned and moved by the `PlanCycle` aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStatus {
    id: StatusId,
    cycle_id: CycleId,
    kind: StepKind,
    completed: bool,
    completed_at: Option<Timestamp>,
    completed_by: Option<StaffId>,
    /// Display-only deadline; meaningful only for the monitoring step.
    due_date: Option<CalendarDate>,
    is_latest: bool,
}

impl StepStatus {
    /// Creates a fresh, incomplete status.
    pub fn new(cycle_id: CycleId, kind: StepKind, is_latest: bool) -> Self {
        Self {
            id: StatusId::new(),
            cycle_id,
            kind,
            completed: false,
            completed_at: None,
            completed_by: None,
            due_date: None,
            is_latest,
        }
    }

    /// Reconstructs a status from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: StatusId,
        cycle_id: CycleId,
        kind: StepKind,
        completed: bool,
        completed_at: Option<Timestamp>,
        completed_by: Option<StaffId>,
        due_date: Option<CalendarDate>,
        is_latest: bool,
    ) -> Self {
        Self {
            id,
            cycle_id,
            kind,
            completed,
            completed_at,
            completed_by,
            due_date,
            is_latest,
        }
    }

    pub fn id(&self) -> StatusId {
        self.id
    }

    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn completed_by(&self) -> Option<StaffId> {
        self.completed_by
    }

    pub fn due_date(&self) -> Option<CalendarDate> {
        self.due_date
    }

    pub fn is_latest(&self) -> bool {
        self.is_latest
    }

    pub(crate) fn mark_completed(&mut self, at: Timestamp, by: StaffId) {
        self.completed = true;
        self.completed_at = Some(at);
        self.completed_by = Some(by);
    }

    pub(crate) fn reset_completion(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.completed_by = None;
    }

    pub(crate) fn set_latest(&mut self, latest: bool) {
        self.is_latest = latest;
    }

    pub(crate) fn set_due_date(&mut self, due_date: Option<CalendarDate>) {
        self.due_date = due_date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_is_incomplete() {
        let status = StepStatus::new(CycleId::new(), StepKind::Assessment, true);
        assert!(!status.is_completed());
        assert!(status.completed_at().is_none());
        assert!(status.completed_by().is_none());
        assert!(status.is_latest());
    }

    #[test]
    fn mark_and_reset_completion() {
        let mut status = StepStatus::new(CycleId::new(), StepKind::DraftPlan, false);
        let staff = StaffId::new();
        let at = Timestamp::now();

        status.mark_completed(at, staff);
        assert!(status.is_completed());
        assert_eq!(status.completed_at(), Some(at));
        assert_eq!(status.completed_by(), Some(staff));

        status.reset_completion();
        assert!(!status.is_completed());
        assert!(status.completed_at().is_none());
        assert!(status.completed_by().is_none());
    }
}
