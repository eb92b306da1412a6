use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::blocks::{BoostBlockView, UpgradeBlockView};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub is_used_daily_code: bool,
    pub is_used_daily_claim: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

/// Composed per-user view: reward flags, balance, accrual snapshot and the
/// ownership-annotated catalog. `user_mining_data` is an empty object when
/// the user has no mining session.
#[derive(Clone, Debug, Serialize)]
pub struct UserState {
    pub is_used_daily_code: bool,
    pub is_used_daily_claim: bool,
    pub total_balance: i64,
    pub daily_claim_point: i64,
    pub user_mining_data: Value,
    pub booster: Booster,
}

#[derive(Clone, Debug, Serialize)]
pub struct Booster {
    pub upgrades: Vec<UpgradeBlockView>,
    pub boosts: Vec<BoostBlockView>,
}
