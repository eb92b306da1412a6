use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct UpgradeBlock {
    pub id: String,
    pub speed: i32,
    pub point: i32,
    pub native_price: i64,
    pub ton_price: i64,
    pub level: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct BoostBlock {
    pub id: String,
    pub speed: i32,
    pub duration: i32,
    pub ton_price: i64,
    pub is_free: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ownership row: block parameters are snapshotted at acquisition time, so
/// later catalog edits do not change what the user already owns.
#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserUpgradeBlock {
    pub id: String,
    pub user_id: String,
    pub upgrade_block_id: String,
    pub speed: i32,
    pub point: i32,
    pub native_price: i64,
    pub ton_price: i64,
    pub level: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserBoostBlock {
    pub id: String,
    pub user_id: String,
    pub boost_block_id: String,
    pub speed: i32,
    pub duration: i32,
    pub ton_price: i64,
    pub is_free: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog entry annotated per user. `is_active` here means "this user owns
/// this block", shadowing the catalog's own publication flag of the same
/// name (the publication flag only filters which entries are listed).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpgradeBlockView {
    pub id: String,
    pub speed: i32,
    pub point: i32,
    pub native_price: i64,
    pub ton_price: i64,
    pub level: i32,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoostBlockView {
    pub id: String,
    pub speed: i32,
    pub duration: i32,
    pub ton_price: i64,
    pub is_free: bool,
    pub is_active: bool,
}
