use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct DailyCode {
    pub id: String,
    pub code: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// The two one-shot rewards. Each is an independent UNCLAIMED -> CLAIMED
/// state machine per user with no reversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardKind {
    DailyCode,
    DailyClaim,
}

impl RewardKind {
    /// Settings key holding the reward amount.
    pub fn setting_key(self) -> &'static str {
        match self {
            RewardKind::DailyCode => "code_point",
            RewardKind::DailyClaim => "daily_point",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SubmittedCode {
    pub code: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RewardGrant {
    pub total_balance: i64,
    pub point: i64,
}
