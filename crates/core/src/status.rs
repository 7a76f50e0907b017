//! Analysis lifecycle status vocabulary.
//!
//! An analysis moves `pending → processing → completed | failed` on the
//! server. The client only ever observes snapshots of this lifecycle, so
//! the vocabulary and the monotonicity rule live here where both the
//! service client and the CLI can reach them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Server-side processing state of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Accepted, waiting for a worker.
    Pending,
    /// A worker is running the risk model.
    Processing,
    /// Finished successfully; a result is available.
    Completed,
    /// Finished unsuccessfully; no result will appear.
    Failed,
}

impl AnalysisStatus {
    /// Wire representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// Whether the lifecycle has ended; terminal statuses never change.
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Whether observing `next` after `self` is consistent with the
    /// monotonic lifecycle. Repeats of the same status are allowed;
    /// moving backwards (e.g. `processing → pending`) is not, and
    /// nothing follows a terminal status.
    pub fn can_transition_to(self, next: AnalysisStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }

    /// Position in the lifecycle; both terminal statuses share the top
    /// rank since neither can follow the other.
    fn rank(self) -> u8 {
        match self {
            AnalysisStatus::Pending => 0,
            AnalysisStatus::Processing => 1,
            AnalysisStatus::Completed | AnalysisStatus::Failed => 2,
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "processing" => Ok(AnalysisStatus::Processing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}
