//! Deliverable entity - an uploaded artifact for one step of one cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{CycleId, DeliverableId, DeliverableKind, StaffId, Timestamp};

/// Opaque reference to a stored artifact.
///
/// The binary itself lives in the external storage collaborator; the
/// engine only carries the reference it hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uploaded document backing one step of one cycle.
///
/// At most one deliverable exists per (cycle, kind); a re-upload replaces
/// the artifact in place without touching the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    id: DeliverableId,
    cycle_id: CycleId,
    kind: DeliverableKind,
    artifact: ArtifactRef,
    original_filename: String,
    uploaded_by: StaffId,
    uploaded_at: Timestamp,
    updated_at: Timestamp,
}

impl Deliverable {
    /// Creates a new deliverable record for a fresh upload.
    pub fn new(
        cycle_id: CycleId,
        kind: DeliverableKind,
        artifact: ArtifactRef,
        original_filename: impl Into<String>,
        uploaded_by: StaffId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: DeliverableId::new(),
            cycle_id,
            kind,
            artifact,
            original_filename: original_filename.into(),
            uploaded_by,
            uploaded_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a deliverable from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: DeliverableId,
        cycle_id: CycleId,
        kind: DeliverableKind,
        artifact: ArtifactRef,
        original_filename: String,
        uploaded_by: StaffId,
        uploaded_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            cycle_id,
            kind,
            artifact,
            original_filename,
            uploaded_by,
            uploaded_at,
            updated_at,
        }
    }

    pub fn id(&self) -> DeliverableId {
        self.id
    }

    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
    }

    pub fn kind(&self) -> DeliverableKind {
        self.kind
    }

    pub fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn uploaded_by(&self) -> StaffId {
        self.uploaded_by
    }

    pub fn uploaded_at(&self) -> Timestamp {
        self.uploaded_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Replaces the stored artifact on re-upload.
    ///
    /// Pure replacement: the step status and cursor are untouched.
    pub fn replace_artifact(
        &mut self,
        artifact: ArtifactRef,
        original_filename: impl Into<String>,
        uploaded_by: StaffId,
    ) {
        self.artifact = artifact;
        self.original_filename = original_filename.into();
        self.uploaded_by = uploaded_by;
        self.updated_at = Timestamp::now();
    }
}
