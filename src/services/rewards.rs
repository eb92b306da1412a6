use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::rewards::{RewardGrant, RewardKind};
use crate::repositories::rewards::RewardRepository;
use crate::repositories::settings::SettingsRepository;
use crate::repositories::users::UserRepository;

pub enum RewardRequest {
    RedeemCode {
        user_id: String,
        code: String,
        response: oneshot::Sender<Result<RewardGrant, ServiceError>>,
    },
    ClaimDaily {
        user_id: String,
        response: oneshot::Sender<Result<RewardGrant, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct RewardRequestHandler {
    users: UserRepository,
    rewards: RewardRepository,
    settings: SettingsRepository,
}

impl RewardRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        RewardRequestHandler {
            users: UserRepository::new(sql_conn.clone()),
            rewards: RewardRepository::new(sql_conn.clone()),
            settings: SettingsRepository::new(sql_conn),
        }
    }

    async fn redeem_code(&self, user_id: &str, code: &str) -> Result<RewardGrant, ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        let active_code = self
            .rewards
            .get_active_code(Utc::now())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        match active_code {
            Some(active) if active.code == code => {}
            _ => return Err(ServiceError::Domain("Incorrect daily code.".to_string())),
        }

        // Courtesy fast-fail; the conditional update inside grant() is the
        // guard that actually closes the race.
        if user.is_used_daily_code {
            return Err(already_used(RewardKind::DailyCode));
        }

        self.grant(user_id, RewardKind::DailyCode).await
    }

    async fn claim_daily(&self, user_id: &str) -> Result<RewardGrant, ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        if user.is_used_daily_claim {
            return Err(already_used(RewardKind::DailyClaim));
        }

        self.grant(user_id, RewardKind::DailyClaim).await
    }

    async fn grant(&self, user_id: &str, kind: RewardKind) -> Result<RewardGrant, ServiceError> {
        let point = self
            .settings
            .get_value(kind.setting_key())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let granted = self
            .rewards
            .grant(user_id, kind, point)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        match granted {
            Some(total_balance) => Ok(RewardGrant {
                total_balance,
                point,
            }),
            None => Err(already_used(kind)),
        }
    }
}

fn already_used(kind: RewardKind) -> ServiceError {
    let message = match kind {
        RewardKind::DailyCode => "Daily code has already been used.",
        RewardKind::DailyClaim => "Daily claim has already been used.",
    };

    ServiceError::Domain(message.to_string())
}

#[async_trait]
impl RequestHandler<RewardRequest> for RewardRequestHandler {
    async fn handle_request(&self, request: RewardRequest) {
        match request {
            RewardRequest::RedeemCode {
                user_id,
                code,
                response,
            } => {
                let grant = self.redeem_code(&user_id, &code).await;
                let _ = response.send(grant);
            }
            RewardRequest::ClaimDaily { user_id, response } => {
                let grant = self.claim_daily(&user_id).await;
                let _ = response.send(grant);
            }
        }
    }
}

pub struct RewardService;

impl RewardService {
    pub fn new() -> Self {
        RewardService {}
    }
}

#[async_trait]
impl Service<RewardRequest, RewardRequestHandler> for RewardService {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_kinds_read_their_own_setting() {
        assert_eq!(RewardKind::DailyCode.setting_key(), "code_point");
        assert_eq!(RewardKind::DailyClaim.setting_key(), "daily_point");
    }

    #[test]
    fn already_used_messages_name_the_reward() {
        assert!(matches!(
            already_used(RewardKind::DailyCode),
            ServiceError::Domain(m) if m.contains("Daily code")
        ));
        assert!(matches!(
            already_used(RewardKind::DailyClaim),
            ServiceError::Domain(m) if m.contains("Daily claim")
        ));
    }
}
