use crate::models::blocks::{BoostBlock, UpgradeBlock, UserBoostBlock, UserUpgradeBlock};

use sqlx::PgPool;

/// Read side of the block catalog: published definitions plus per-user
/// ownership rows. Catalog administration is handled elsewhere.
#[derive(Clone)]
pub struct BlockRepository {
    conn: PgPool,
}

impl BlockRepository {
    pub fn new(conn: PgPool) -> Self {
        BlockRepository { conn }
    }

    pub async fn get_active_upgrade_blocks(&self) -> Result<Vec<UpgradeBlock>, anyhow::Error> {
        let blocks = sqlx::query_as::<_, UpgradeBlock>(
            "SELECT * FROM upgrade_blocks WHERE is_active = true ORDER BY level",
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(blocks)
    }

    pub async fn get_active_boost_blocks(&self) -> Result<Vec<BoostBlock>, anyhow::Error> {
        let blocks = sqlx::query_as::<_, BoostBlock>(
            "SELECT * FROM boost_blocks WHERE is_active = true ORDER BY speed",
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(blocks)
    }

    pub async fn get_user_upgrade_blocks(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserUpgradeBlock>, anyhow::Error> {
        let blocks = sqlx::query_as::<_, UserUpgradeBlock>(
            "SELECT * FROM users_upgrade_blocks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(blocks)
    }

    pub async fn get_user_boost_blocks(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserBoostBlock>, anyhow::Error> {
        let blocks = sqlx::query_as::<_, UserBoostBlock>(
            "SELECT * FROM users_boost_blocks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(blocks)
    }
}
