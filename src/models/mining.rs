use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MS_PER_HOUR: i64 = 3_600_000;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct MiningSession {
    pub id: String,
    pub user_id: String,
    pub boost_speed: i32,
    pub upgrade_speed: i32,
    pub is_can_claim: bool,
    pub last_claimed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewMiningSession {
    pub upgrade_speed: Option<i32>,
    pub boost_speed: Option<i32>,
}

/// Accrual snapshot for one session at one sampled instant. Field names are
/// part of the wire contract; `miningLeftSecond` carries milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningSessionView {
    pub boost_speed: i32,
    pub upgrade_speed: i32,
    pub block_point: i64,
    pub mining_left_second: i64,
    pub mining_points: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SettledMining {
    pub total_balance: i64,
    pub mining: MiningSessionView,
}

impl MiningSession {
    /// Converts elapsed time since the last settlement into earned points
    /// and remaining cycle time. Pure and total: identical inputs give
    /// identical output, no output is ever negative, and a `now` before
    /// `last_claimed_at` collapses the elapsed time to zero.
    ///
    /// The boost multiplier is carried in the view but not folded into the
    /// rate; only the upgrade multiplier scales the base point.
    pub fn accrue(
        &self,
        base_block_point: i64,
        cycle_duration_ms: i64,
        now: DateTime<Utc>,
    ) -> MiningSessionView {
        let elapsed_ms = (now - self.last_claimed_at).num_milliseconds();
        let past_ms = elapsed_ms.max(0);
        let remaining_ms = (cycle_duration_ms - elapsed_ms).max(0);

        let block_point = base_block_point * i64::from(self.upgrade_speed);
        let mining_points = block_point * past_ms / MS_PER_HOUR;

        MiningSessionView {
            boost_speed: self.boost_speed,
            upgrade_speed: self.upgrade_speed,
            block_point,
            mining_left_second: remaining_ms,
            mining_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(last_claimed_at: DateTime<Utc>, upgrade_speed: i32, boost_speed: i32) -> MiningSession {
        MiningSession {
            id: "c5b0e5a4-0000-4000-8000-000000000001".to_string(),
            user_id: "c5b0e5a4-0000-4000-8000-000000000002".to_string(),
            boost_speed,
            upgrade_speed,
            is_can_claim: false,
            last_claimed_at,
            created_at: last_claimed_at,
            updated_at: last_claimed_at,
        }
    }

    const DAY_MS: i64 = 24 * MS_PER_HOUR;

    #[test]
    fn two_hours_at_double_speed() {
        let now = Utc::now();
        let s = session(now - Duration::hours(2), 2, 3);

        let view = s.accrue(75, DAY_MS, now);

        assert_eq!(view.block_point, 150);
        assert_eq!(view.mining_points, 300);
        assert_eq!(view.mining_left_second, 22 * MS_PER_HOUR);
        assert_eq!(view.upgrade_speed, 2);
        assert_eq!(view.boost_speed, 3);
    }

    #[test]
    fn boost_speed_is_reported_but_not_multiplied() {
        let now = Utc::now();
        let s = session(now - Duration::hours(1), 1, 5);

        let view = s.accrue(100, DAY_MS, now);

        assert_eq!(view.block_point, 100);
        assert_eq!(view.mining_points, 100);
    }

    #[test]
    fn points_floor_partial_hours() {
        let now = Utc::now();
        let s = session(now - Duration::minutes(30), 1, 1);

        // 75 * 0.5h = 37.5, floored.
        let view = s.accrue(75, DAY_MS, now);

        assert_eq!(view.mining_points, 37);
    }

    #[test]
    fn clock_skew_collapses_to_zero_elapsed() {
        let now = Utc::now();
        let s = session(now + Duration::minutes(5), 4, 1);

        let view = s.accrue(75, DAY_MS, now);

        assert_eq!(view.mining_points, 0);
        // Remaining time is measured from last_claimed_at, so a future
        // timestamp extends it past the cycle length rather than clamping.
        assert_eq!(view.mining_left_second, DAY_MS + 5 * 60 * 1000);
    }

    #[test]
    fn remaining_time_floors_at_zero_after_cycle_end() {
        let now = Utc::now();
        let s = session(now - Duration::hours(30), 1, 1);

        let view = s.accrue(75, DAY_MS, now);

        assert_eq!(view.mining_left_second, 0);
        assert_eq!(view.mining_points, 75 * 30);
    }

    #[test]
    fn accrue_is_idempotent_for_identical_inputs() {
        let now = Utc::now();
        let s = session(now - Duration::hours(7), 3, 2);

        assert_eq!(s.accrue(75, DAY_MS, now), s.accrue(75, DAY_MS, now));
    }

    #[test]
    fn view_serializes_with_wire_field_names() {
        let now = Utc::now();
        let s = session(now - Duration::hours(1), 1, 1);

        let json = serde_json::to_value(s.accrue(75, DAY_MS, now)).unwrap();

        assert!(json.get("miningPoints").is_some());
        assert!(json.get("miningLeftSecond").is_some());
        assert!(json.get("blockPoint").is_some());
        assert!(json.get("upgradeSpeed").is_some());
        assert!(json.get("boostSpeed").is_some());
    }
}
