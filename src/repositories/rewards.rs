use crate::models::rewards::{DailyCode, RewardKind};

use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Clone)]
pub struct RewardRepository {
    conn: PgPool,
}

impl RewardRepository {
    pub fn new(conn: PgPool) -> Self {
        RewardRepository { conn }
    }

    /// The code whose `active` flag is set and whose validity window covers
    /// `now`. Newest wins if operators left more than one row active.
    pub async fn get_active_code(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DailyCode>, anyhow::Error> {
        let code = sqlx::query_as::<_, DailyCode>(
            r#"
                SELECT * FROM daily_code
                WHERE active = true AND start_at <= $1 AND end_at >= $1
                ORDER BY created_at DESC
                LIMIT 1
            "#,
        )
        .bind(now)
        .fetch_optional(&self.conn)
        .await?;

        Ok(code)
    }

    /// Grants a one-shot reward exactly once. The conditional flag update is
    /// the authoritative guard: if the flag was already set the transaction
    /// touches nothing and `None` comes back. The balance update is a
    /// relative increment so concurrent grants of the other reward kind
    /// cannot clobber each other.
    pub async fn grant(
        &self,
        user_id: &str,
        kind: RewardKind,
        point: i64,
    ) -> Result<Option<i64>, anyhow::Error> {
        let flag_update = match kind {
            RewardKind::DailyCode => {
                "UPDATE users SET is_used_daily_code = true \
                 WHERE id = $1 AND is_used_daily_code = false"
            }
            RewardKind::DailyClaim => {
                "UPDATE users SET is_used_daily_claim = true \
                 WHERE id = $1 AND is_used_daily_claim = false"
            }
        };

        let mut tx = self.conn.begin().await?;

        let flagged = sqlx::query(flag_update)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if flagged == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let total_balance: i64 = sqlx::query_scalar(
            r#"
                UPDATE balances SET total_balance = total_balance + $1
                WHERE user_id = $2
                RETURNING total_balance
            "#,
        )
        .bind(point)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(total_balance))
    }
}
