use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::mining::{MiningSession, NewMiningSession, SettledMining};
use crate::repositories::mining::MiningRepository;
use crate::repositories::settings::SettingsRepository;
use crate::repositories::users::UserRepository;

pub enum MiningRequest {
    CreateSession {
        user_id: String,
        new_session: NewMiningSession,
        response: oneshot::Sender<Result<MiningSession, ServiceError>>,
    },
    GetSession {
        user_id: String,
        response: oneshot::Sender<Result<Option<MiningSession>, ServiceError>>,
    },
    UpdateSpeeds {
        user_id: String,
        new_session: NewMiningSession,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    Settle {
        user_id: String,
        response: oneshot::Sender<Result<SettledMining, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct MiningRequestHandler {
    users: UserRepository,
    mining: MiningRepository,
    settings: SettingsRepository,
}

impl MiningRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        MiningRequestHandler {
            users: UserRepository::new(sql_conn.clone()),
            mining: MiningRepository::new(sql_conn.clone()),
            settings: SettingsRepository::new(sql_conn),
        }
    }

    async fn create_session(
        &self,
        user_id: &str,
        new_session: NewMiningSession,
    ) -> Result<MiningSession, ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        if user.is_none() {
            return Err(ServiceError::NotFound("User not found.".to_string()));
        }

        let existing = self
            .mining
            .get_session(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        if existing.is_some() {
            return Err(ServiceError::Domain(
                "Mining session already exists.".to_string(),
            ));
        }

        self.mining
            .insert_session(
                user_id,
                new_session.upgrade_speed.unwrap_or(1),
                new_session.boost_speed.unwrap_or(1),
            )
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn get_session(&self, user_id: &str) -> Result<Option<MiningSession>, ServiceError> {
        self.mining
            .get_session(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn update_speeds(
        &self,
        user_id: &str,
        new_session: NewMiningSession,
    ) -> Result<(), ServiceError> {
        let session = self
            .mining
            .get_session(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let session = match session {
            Some(session) => session,
            None => {
                return Err(ServiceError::NotFound(
                    "Mining session not found.".to_string(),
                ))
            }
        };

        self.mining
            .update_speeds(
                user_id,
                new_session.upgrade_speed.unwrap_or(session.upgrade_speed),
                new_session.boost_speed.unwrap_or(session.boost_speed),
            )
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn settle(&self, user_id: &str) -> Result<SettledMining, ServiceError> {
        let block_point = self
            .settings
            .get_value("mining_block_point")
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let cycle_duration_ms = self
            .settings
            .get_value("mining_cycle_duration_ms")
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let settled = self
            .mining
            .settle(user_id, block_point, cycle_duration_ms, Utc::now())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        settled.ok_or_else(|| ServiceError::NotFound("Mining session not found.".to_string()))
    }
}

#[async_trait]
impl RequestHandler<MiningRequest> for MiningRequestHandler {
    async fn handle_request(&self, request: MiningRequest) {
        match request {
            MiningRequest::CreateSession {
                user_id,
                new_session,
                response,
            } => {
                let session = self.create_session(&user_id, new_session).await;
                let _ = response.send(session);
            }
            MiningRequest::GetSession { user_id, response } => {
                let session = self.get_session(&user_id).await;
                let _ = response.send(session);
            }
            MiningRequest::UpdateSpeeds {
                user_id,
                new_session,
                response,
            } => {
                let result = self.update_speeds(&user_id, new_session).await;
                let _ = response.send(result);
            }
            MiningRequest::Settle { user_id, response } => {
                let settled = self.settle(&user_id).await;
                let _ = response.send(settled);
            }
        }
    }
}

pub struct MiningService;

impl MiningService {
    pub fn new() -> Self {
        MiningService {}
    }
}

#[async_trait]
impl Service<MiningRequest, MiningRequestHandler> for MiningService {}
