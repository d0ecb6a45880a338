//! DeliverableKind enum and its mapping onto plan steps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{DomainError, ErrorCode, StepKind};

/// The document kinds a staff member can upload, one per plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableKind {
    AssessmentSheet,
    DraftPlanPdf,
    StaffMeetingMinutes,
    FinalPlanSignedPdf,
    MonitoringReportPdf,
}

impl DeliverableKind {
    /// Returns all deliverable kinds in step order.
    pub fn all() -> &'static [DeliverableKind] {
        &[
            DeliverableKind::AssessmentSheet,
            DeliverableKind::DraftPlanPdf,
            DeliverableKind::StaffMeetingMinutes,
            DeliverableKind::FinalPlanSignedPdf,
            DeliverableKind::MonitoringReportPdf,
        ]
    }

    /// Returns the plan step this deliverable documents.
    pub fn step(&self) -> StepKind {
        match self {
            DeliverableKind::AssessmentSheet => StepKind::Assessment,
            DeliverableKind::DraftPlanPdf => StepKind::DraftPlan,
            DeliverableKind::StaffMeetingMinutes => StepKind::StaffMeeting,
            DeliverableKind::FinalPlanSignedPdf => StepKind::FinalPlanSigned,
            DeliverableKind::MonitoringReportPdf => StepKind::Monitoring,
        }
    }

    /// Returns the deliverable kind documenting a given step.
    pub fn for_step(step: StepKind) -> DeliverableKind {
        match step {
            StepKind::Assessment => DeliverableKind::AssessmentSheet,
            StepKind::DraftPlan => DeliverableKind::DraftPlanPdf,
            StepKind::StaffMeeting => DeliverableKind::StaffMeetingMinutes,
            StepKind::FinalPlanSigned => DeliverableKind::FinalPlanSignedPdf,
            StepKind::Monitoring => DeliverableKind::MonitoringReportPdf,
        }
    }

    /// Returns the stable snake_case name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliverableKind::AssessmentSheet => "assessment_sheet",
            DeliverableKind::DraftPlanPdf => "draft_plan_pdf",
            DeliverableKind::StaffMeetingMinutes => "staff_meeting_minutes",
            DeliverableKind::FinalPlanSignedPdf => "final_plan_signed_pdf",
            DeliverableKind::MonitoringReportPdf => "monitoring_report_pdf",
        }
    }
}

impl fmt::Display for DeliverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeliverableKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UnknownDeliverableKind,
                    format!("Unknown deliverable kind: {}", s),
                )
                .with_detail("kind", s)
            })
    }
}
