use anyhow::bail;
use sqlx::PgPool;

/// Reader for the `settings` table, which holds the game-tunable numbers
/// (`code_point`, `daily_point`, `mining_block_point`,
/// `mining_cycle_duration_ms`).
#[derive(Clone)]
pub struct SettingsRepository {
    conn: PgPool,
}

impl SettingsRepository {
    pub fn new(conn: PgPool) -> Self {
        SettingsRepository { conn }
    }

    pub async fn get_value(&self, key: &str) -> Result<i64, anyhow::Error> {
        let value: Option<i64> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.conn)
            .await?;

        match value {
            Some(value) => Ok(value),
            None => bail!("Missing setting: {}", key),
        }
    }
}
