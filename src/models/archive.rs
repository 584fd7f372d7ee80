use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BetType, Prediction};

/// Lifecycle state of an archived prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStatus {
    /// Waiting for an outcome
    Pending,
    /// Settled without a correctness verdict (only seen in imported archives)
    Verified,
    /// Prediction matched the outcome
    Correct,
    /// Prediction missed
    Incorrect,
}

impl ArchiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStatus::Pending => "pending",
            ArchiveStatus::Verified => "verified",
            ArchiveStatus::Correct => "correct",
            ArchiveStatus::Incorrect => "incorrect",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ArchiveStatus::Pending)
    }
}

impl FromStr for ArchiveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ArchiveStatus::Pending),
            "verified" => Ok(ArchiveStatus::Verified),
            "correct" => Ok(ArchiveStatus::Correct),
            "incorrect" => Ok(ArchiveStatus::Incorrect),
            other => Err(format!("unknown archive status '{}'", other)),
        }
    }
}

/// A prediction kept for later verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    /// Unique entry identifier
    pub id: String,

    #[serde(flatten)]
    pub prediction: Prediction,

    pub added_at: DateTime<Utc>,

    pub status: ArchiveStatus,

    /// Set on the transition out of pending
    pub verified: bool,

    /// Outcome reported at verification
    pub actual_result: Option<BetType>,
}

impl ArchiveEntry {
    pub fn is_pending(&self) -> bool {
        self.status == ArchiveStatus::Pending
    }
}
