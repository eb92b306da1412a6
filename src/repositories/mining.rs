use crate::models::mining::{MiningSession, SettledMining};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct MiningRepository {
    conn: PgPool,
}

impl MiningRepository {
    pub fn new(conn: PgPool) -> Self {
        MiningRepository { conn }
    }

    pub async fn insert_session(
        &self,
        user_id: &str,
        upgrade_speed: i32,
        boost_speed: i32,
    ) -> Result<MiningSession, anyhow::Error> {
        let session_id = Uuid::new_v4().hyphenated().to_string();

        let session = sqlx::query_as::<_, MiningSession>(
            r#"
                INSERT INTO mining_sessions (id, user_id, upgrade_speed, boost_speed)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            "#,
        )
        .bind(&session_id)
        .bind(user_id)
        .bind(upgrade_speed.max(1))
        .bind(boost_speed.max(1))
        .fetch_one(&self.conn)
        .await?;

        Ok(session)
    }

    pub async fn get_session(
        &self,
        user_id: &str,
    ) -> Result<Option<MiningSession>, anyhow::Error> {
        let session =
            sqlx::query_as::<_, MiningSession>("SELECT * FROM mining_sessions WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(session)
    }

    pub async fn update_speeds(
        &self,
        user_id: &str,
        upgrade_speed: i32,
        boost_speed: i32,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
                UPDATE mining_sessions
                SET upgrade_speed = $1, boost_speed = $2, updated_at = CURRENT_TIMESTAMP
                WHERE user_id = $3
            "#,
        )
        .bind(upgrade_speed.max(1))
        .bind(boost_speed.max(1))
        .bind(user_id)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    /// Materializes accrued points into the balance. The session row is
    /// locked for the duration of the transaction so two concurrent
    /// settlements cannot both pay out the same elapsed time, and
    /// `last_claimed_at` never moves backwards.
    pub async fn settle(
        &self,
        user_id: &str,
        base_block_point: i64,
        cycle_duration_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<SettledMining>, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let session = sqlx::query_as::<_, MiningSession>(
            "SELECT * FROM mining_sessions WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let session = match session {
            Some(session) => session,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        let mining = session.accrue(base_block_point, cycle_duration_ms, now);
        let claimed_at = now.max(session.last_claimed_at);

        sqlx::query(
            r#"
                UPDATE mining_sessions
                SET last_claimed_at = $1, is_can_claim = false, updated_at = CURRENT_TIMESTAMP
                WHERE id = $2
            "#,
        )
        .bind(claimed_at)
        .bind(&session.id)
        .execute(&mut *tx)
        .await?;

        let total_balance: i64 = sqlx::query_scalar(
            r#"
                UPDATE balances SET total_balance = total_balance + $1
                WHERE user_id = $2
                RETURNING total_balance
            "#,
        )
        .bind(mining.mining_points)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(SettledMining {
            total_balance,
            mining,
        }))
    }
}
