use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::blocks::{
    BoostBlock, BoostBlockView, UpgradeBlock, UpgradeBlockView, UserBoostBlock, UserUpgradeBlock,
};
use crate::models::users::{Booster, NewUser, User, UserState};
use crate::repositories::blocks::BlockRepository;
use crate::repositories::mining::MiningRepository;
use crate::repositories::settings::SettingsRepository;
use crate::repositories::users::UserRepository;

pub enum UserRequest {
    CreateUser {
        new_user: NewUser,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    GetUser {
        id: String,
        response: oneshot::Sender<Result<Option<User>, ServiceError>>,
    },
    GetUserState {
        id: String,
        response: oneshot::Sender<Result<UserState, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    users: UserRepository,
    mining: MiningRepository,
    blocks: BlockRepository,
    settings: SettingsRepository,
}

impl UserRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        UserRequestHandler {
            users: UserRepository::new(sql_conn.clone()),
            mining: MiningRepository::new(sql_conn.clone()),
            blocks: BlockRepository::new(sql_conn.clone()),
            settings: SettingsRepository::new(sql_conn),
        }
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, ServiceError> {
        let existing = self
            .users
            .get_user_by_telegram_id(new_user.telegram_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        if existing.is_some() {
            return Err(ServiceError::Domain(
                "Telegram id is already registered.".to_string(),
            ));
        }

        self.users
            .insert_user(&new_user)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.users
            .get_user_by_id(id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    /// Gathers balance, settings, the optional mining session and both
    /// catalogs in parallel, then composes the response. A missing session
    /// yields an empty mining section, not an error; any gather failure
    /// surfaces as one generic domain error.
    async fn get_user_state(&self, id: &str) -> Result<UserState, ServiceError> {
        let user = self
            .users
            .get_user_by_id(id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        let (
            total_balance,
            daily_claim_point,
            block_point,
            cycle_duration_ms,
            session,
            upgrade_catalog,
            boost_catalog,
            owned_upgrades,
            owned_boosts,
        ) = tokio::try_join!(
            self.users.get_total_balance(id),
            self.settings.get_value("daily_point"),
            self.settings.get_value("mining_block_point"),
            self.settings.get_value("mining_cycle_duration_ms"),
            self.mining.get_session(id),
            self.blocks.get_active_upgrade_blocks(),
            self.blocks.get_active_boost_blocks(),
            self.blocks.get_user_upgrade_blocks(id),
            self.blocks.get_user_boost_blocks(id),
        )
        .map_err(|e| {
            log::error!("Failed to gather user state for {}: {}", id, e);
            ServiceError::Domain("Something went wrong.".to_string())
        })?;

        let user_mining_data = match session {
            Some(session) => json!(session.accrue(block_point, cycle_duration_ms, Utc::now())),
            None => json!({}),
        };

        Ok(UserState {
            is_used_daily_code: user.is_used_daily_code,
            is_used_daily_claim: user.is_used_daily_claim,
            total_balance,
            daily_claim_point,
            user_mining_data,
            booster: Booster {
                upgrades: annotate_upgrades(upgrade_catalog, &owned_upgrades),
                boosts: annotate_boosts(boost_catalog, &owned_boosts),
            },
        })
    }
}

/// Marks each published upgrade block with whether this user owns it. The
/// view's `is_active` is ownership, not the catalog publication flag.
pub fn annotate_upgrades(
    catalog: Vec<UpgradeBlock>,
    owned: &[UserUpgradeBlock],
) -> Vec<UpgradeBlockView> {
    catalog
        .into_iter()
        .map(|block| {
            let is_owned = owned.iter().any(|o| o.upgrade_block_id == block.id);
            UpgradeBlockView {
                id: block.id,
                speed: block.speed,
                point: block.point,
                native_price: block.native_price,
                ton_price: block.ton_price,
                level: block.level,
                is_active: is_owned,
            }
        })
        .collect()
}

pub fn annotate_boosts(catalog: Vec<BoostBlock>, owned: &[UserBoostBlock]) -> Vec<BoostBlockView> {
    catalog
        .into_iter()
        .map(|block| {
            let is_owned = owned.iter().any(|o| o.boost_block_id == block.id);
            BoostBlockView {
                id: block.id,
                speed: block.speed,
                duration: block.duration,
                ton_price: block.ton_price,
                is_free: block.is_free,
                is_active: is_owned,
            }
        })
        .collect()
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::CreateUser { new_user, response } => {
                let user = self.create_user(new_user).await;
                let _ = response.send(user);
            }
            UserRequest::GetUser { id, response } => {
                let user = self.get_user(&id).await;
                let _ = response.send(user);
            }
            UserRequest::GetUserState { id, response } => {
                let state = self.get_user_state(&id).await;
                let _ = response.send(state);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn upgrade_block(id: &str, level: i32) -> UpgradeBlock {
        let now = Utc::now();
        UpgradeBlock {
            id: id.to_string(),
            speed: 2,
            point: 75,
            native_price: 1000,
            ton_price: 10,
            level,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn owned_upgrade(user_id: &str, block_id: &str) -> UserUpgradeBlock {
        let now = Utc::now();
        UserUpgradeBlock {
            id: format!("own-{}", block_id),
            user_id: user_id.to_string(),
            upgrade_block_id: block_id.to_string(),
            speed: 2,
            point: 75,
            native_price: 1000,
            ton_price: 10,
            level: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn annotates_owned_blocks_only() {
        let catalog = vec![upgrade_block("block-1", 1), upgrade_block("block-2", 2)];
        let owned = vec![owned_upgrade("user-1", "block-1")];

        let views = annotate_upgrades(catalog, &owned);

        assert_eq!(views.len(), 2);
        assert!(views[0].is_active);
        assert!(!views[1].is_active);
    }

    #[test]
    fn empty_ownership_marks_nothing_active() {
        let catalog = vec![upgrade_block("block-1", 1)];

        let views = annotate_upgrades(catalog, &[]);

        assert!(!views[0].is_active);
    }

    #[test]
    fn view_overrides_publication_flag_with_ownership() {
        // The catalog row is published (is_active = true in storage) but the
        // user does not own it, so the view reports false.
        let catalog = vec![upgrade_block("block-1", 1)];
        assert!(catalog[0].is_active);

        let views = annotate_upgrades(catalog, &[]);

        assert!(!views[0].is_active);
    }

    #[test]
    fn boost_annotation_matches_on_boost_block_id() {
        let now = Utc::now();
        let catalog = vec![BoostBlock {
            id: "boost-1".to_string(),
            speed: 3,
            duration: 600_000,
            ton_price: 5,
            is_free: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }];
        let owned = vec![UserBoostBlock {
            id: "own-boost-1".to_string(),
            user_id: "user-1".to_string(),
            boost_block_id: "boost-1".to_string(),
            speed: 3,
            duration: 600_000,
            ton_price: 5,
            is_free: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }];

        let views = annotate_boosts(catalog, &owned);

        assert!(views[0].is_active);
        assert!(views[0].is_free);
    }
}
