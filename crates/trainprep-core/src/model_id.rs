//! Output mode selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which training table the projector produces.
///
/// The wire names double as the `/ml_training/{model_id}/` directory names
/// consumed by the training jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    /// Base join plus targets, for downstream feature enrichment.
    #[default]
    OutcomeJoined,
    /// Rows with a defined `target_risk`, plus the risk model's feature columns.
    RiskScoring,
    /// Closed rows with a defined `target_win`, plus the win model's feature columns.
    WinProbability,
}

#[derive(Debug, Error)]
#[error("unknown model id '{0}' (expected outcome_joined, risk_scoring or win_probability)")]
pub struct UnknownModelId(pub String);

impl ModelId {
    pub const ALL: [ModelId; 3] = [
        ModelId::OutcomeJoined,
        ModelId::RiskScoring,
        ModelId::WinProbability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutcomeJoined => "outcome_joined",
            Self::RiskScoring => "risk_scoring",
            Self::WinProbability => "win_probability",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = UnknownModelId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownModelId(s.to_string()))
    }
}
