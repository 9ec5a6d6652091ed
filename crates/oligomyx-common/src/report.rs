//! Diagnostic trail for a single stage run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::PdbId;
use crate::error::LookupFailure;

/// Why an identifier did not make it into a stage's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Data was available but the item failed the stage criteria.
    Rejected { detail: String },
    /// The collaborator could not produce data for the item.
    LookupFailed { failure: LookupFailure },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub id: PdbId,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

impl Exclusion {
    pub fn rejected(id: PdbId, detail: impl Into<String>) -> Self {
        Self { id, reason: ExclusionReason::Rejected { detail: detail.into() } }
    }

    pub fn lookup_failed(id: PdbId, failure: LookupFailure) -> Self {
        Self { id, reason: ExclusionReason::LookupFailed { failure } }
    }

    pub fn is_lookup_failure(&self) -> bool {
        matches!(self.reason, ExclusionReason::LookupFailed { .. })
    }
}

/// Result summary of one stage over one identifier list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub run_id: Uuid,
    pub stage: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub input_count: usize,
    pub kept: Vec<PdbId>,
    pub excluded: Vec<Exclusion>,
}

impl StageReport {
    pub fn new(run_id: Uuid, stage: &str, input_count: usize) -> Self {
        Self {
            run_id,
            stage: stage.to_string(),
            started_at: Utc::now(),
            duration_ms: 0,
            input_count,
            kept: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn lookup_failures(&self) -> impl Iterator<Item = &Exclusion> {
        self.excluded.iter().filter(|e| e.is_lookup_failure())
    }

    pub fn finish(mut self) -> Self {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
        self
    }
}
