//! StepKind enum representing the five ordered support plan steps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five support plan steps, in the fixed order every cycle follows.
///
/// `Monitoring` is the terminal step; completing it triggers the rollover
/// into the next cycle rather than an in-cycle cursor advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Assessment,
    DraftPlan,
    StaffMeeting,
    FinalPlanSigned,
    Monitoring,
}

impl StepKind {
    /// Returns all step kinds in canonical order.
    pub fn all() -> &'static [StepKind] {
        &[
            StepKind::Assessment,
            StepKind::DraftPlan,
            StepKind::StaffMeeting,
            StepKind::FinalPlanSigned,
            StepKind::Monitoring,
        ]
    }

    /// Returns the 0-based index of this step in the canonical order.
    pub fn order_index(&self) -> usize {
        Self::all()
            .iter()
            .position(|s| s == self)
            .expect("StepKind must be in all() array")
    }

    /// Returns the next step in order, if any.
    pub fn next(&self) -> Option<StepKind> {
        Self::all().get(self.order_index() + 1).copied()
    }

    /// Returns true if this step comes after another in order.
    pub fn is_after(&self, other: &StepKind) -> bool {
        self.order_index() > other.order_index()
    }

    /// Returns true if this is the terminal step of a cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepKind::Monitoring)
    }

    /// Returns the stable snake_case name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Assessment => "assessment",
            StepKind::DraftPlan => "draft_plan",
            StepKind::StaffMeeting => "staff_meeting",
            StepKind::FinalPlanSigned => "final_plan_signed",
            StepKind::Monitoring => "monitoring",
        }
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            StepKind::Assessment => "Assessment",
            StepKind::DraftPlan => "Draft Plan",
            StepKind::StaffMeeting => "Staff Meeting",
            StepKind::FinalPlanSigned => "Final Plan (Signed)",
            StepKind::Monitoring => "Monitoring",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
