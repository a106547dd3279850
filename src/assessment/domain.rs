use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{FarmType, UserId};

/// Identifier wrapper for completed assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Question id to yes/no answer, one entry per catalog question.
pub type AnswerSet = BTreeMap<String, bool>;

/// Categorical risk bucket derived by thresholding the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Positive-polarity thresholds: a risk score of 30 is already Medium
    /// and 60 is already High.
    pub const fn from_risk_score(risk_score: u8) -> Self {
        if risk_score < 30 {
            RiskTier::Low
        } else if risk_score < 60 {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

/// Completed assessment. Created exactly once per submission and immutable
/// thereafter; the store exposes no update or delete for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub owner_id: UserId,
    pub farm_type: FarmType,
    pub answers: AnswerSet,
    /// 0-100, higher is better biosecurity practice.
    pub compliance_score: u8,
    /// 0-100, inverse of the compliance score.
    pub risk_score: u8,
    pub risk_tier: RiskTier,
    pub created_at: DateTime<Utc>,
}
