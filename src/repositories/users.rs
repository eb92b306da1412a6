use crate::models::users::{NewUser, User};

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        UserRepository { conn }
    }

    /// Creates the user row together with its balances row; both exist or
    /// neither does.
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<User, anyhow::Error> {
        let user_id = Uuid::new_v4().hyphenated().to_string();
        let balance_id = Uuid::new_v4().hyphenated().to_string();

        let mut tx = self.conn.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
                INSERT INTO users (id, telegram_id, username, photo_url)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(new_user.telegram_id)
        .bind(&new_user.username)
        .bind(&new_user.photo_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO balances (id, user_id) VALUES ($1, $2)")
            .bind(&balance_id)
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_total_balance(&self, user_id: &str) -> Result<i64, anyhow::Error> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT total_balance FROM balances WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(balance.unwrap_or(0))
    }
}
