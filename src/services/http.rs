use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::mining::MiningRequest;
use super::rewards::RewardRequest;
use super::users::UserRequest;
use super::ServiceError;
use crate::models::mining::NewMiningSession;
use crate::models::rewards::SubmittedCode;
use crate::models::users::NewUser;

#[derive(Clone)]
struct AppState {
    user_channel: mpsc::Sender<UserRequest>,
    mining_channel: mpsc::Sender<MiningRequest>,
    reward_channel: mpsc::Sender<RewardRequest>,
}

fn error_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Domain(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: ServiceError) -> (StatusCode, Json<Value>) {
    (
        error_status(&error),
        Json(json!({"description": error.to_string()})),
    )
}

fn send_failed(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"description": format!("Failed to process request: {}", e)})),
    )
}

fn receive_failed(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"description": format!("Failed to receive response: {}", e)})),
    )
}

async fn create_user(State(state): State<AppState>, Json(req): Json<NewUser>) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let sent = state
        .user_channel
        .send(UserRequest::CreateUser {
            new_user: req,
            response: user_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match user_rx.await {
        Ok(Ok(user)) => (StatusCode::CREATED, Json(json!(user))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let sent = state
        .user_channel
        .send(UserRequest::GetUser {
            id,
            response: user_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (StatusCode::OK, Json(json!(user))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"description": "User not found."})),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn get_user_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (state_tx, state_rx) = oneshot::channel();

    let sent = state
        .user_channel
        .send(UserRequest::GetUserState {
            id,
            response: state_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match state_rx.await {
        Ok(Ok(user_state)) => (StatusCode::OK, Json(json!(user_state))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn redeem_daily_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmittedCode>,
) -> impl IntoResponse {
    let (reward_tx, reward_rx) = oneshot::channel();

    let sent = state
        .reward_channel
        .send(RewardRequest::RedeemCode {
            user_id: id,
            code: req.code,
            response: reward_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match reward_rx.await {
        Ok(Ok(grant)) => (
            StatusCode::OK,
            Json(json!({
                "totalBalance": grant.total_balance,
                "dailyCodePoint": grant.point,
            })),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn claim_daily(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let (reward_tx, reward_rx) = oneshot::channel();

    let sent = state
        .reward_channel
        .send(RewardRequest::ClaimDaily {
            user_id: id,
            response: reward_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match reward_rx.await {
        Ok(Ok(grant)) => (
            StatusCode::OK,
            Json(json!({
                "totalBalance": grant.total_balance,
                "dailyClaimPoint": grant.point,
            })),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn create_mining_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<NewMiningSession>>,
) -> impl IntoResponse {
    let new_session = body.map(|Json(req)| req).unwrap_or(NewMiningSession {
        upgrade_speed: None,
        boost_speed: None,
    });

    let (mining_tx, mining_rx) = oneshot::channel();

    let sent = state
        .mining_channel
        .send(MiningRequest::CreateSession {
            user_id: id,
            new_session,
            response: mining_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match mining_rx.await {
        Ok(Ok(session)) => (StatusCode::CREATED, Json(json!(session))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn update_mining_speeds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewMiningSession>,
) -> impl IntoResponse {
    let (mining_tx, mining_rx) = oneshot::channel();

    let sent = state
        .mining_channel
        .send(MiningRequest::UpdateSpeeds {
            user_id: id,
            new_session: req,
            response: mining_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match mining_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({"updated": true}))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn get_mining_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (mining_tx, mining_rx) = oneshot::channel();

    let sent = state
        .mining_channel
        .send(MiningRequest::GetSession {
            user_id: id,
            response: mining_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match mining_rx.await {
        Ok(Ok(Some(session))) => (StatusCode::OK, Json(json!(session))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"description": "Mining session not found."})),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

async fn claim_mining(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let (mining_tx, mining_rx) = oneshot::channel();

    let sent = state
        .mining_channel
        .send(MiningRequest::Settle {
            user_id: id,
            response: mining_tx,
        })
        .await;

    if let Err(e) = sent {
        return send_failed(e);
    }

    match mining_rx.await {
        Ok(Ok(settled)) => (StatusCode::OK, Json(json!(settled))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => receive_failed(e),
    }
}

pub async fn start_http_server(
    listen: &str,
    user_channel: mpsc::Sender<UserRequest>,
    mining_channel: mpsc::Sender<MiningRequest>,
    reward_channel: mpsc::Sender<RewardRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        user_channel,
        mining_channel,
        reward_channel,
    };

    let app = Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/state", get(get_user_state))
        .route("/users/{id}/daily-code", post(redeem_daily_code))
        .route("/users/{id}/daily-claim", post(claim_daily))
        .route(
            "/users/{id}/mining",
            get(get_mining_session)
                .post(create_mining_session)
                .put(update_mining_speeds),
        )
        .route("/users/{id}/mining/claim", post(claim_mining))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen).await?;
    println!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_bad_request() {
        let error = ServiceError::Domain("Incorrect daily code.".to_string());
        assert_eq!(error_status(&error), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_entities_map_to_not_found() {
        let error = ServiceError::NotFound("User not found.".to_string());
        assert_eq!(error_status(&error), StatusCode::NOT_FOUND);
    }

    #[test]
    fn everything_else_maps_to_internal_error() {
        let database = ServiceError::Database("connection reset".to_string());
        let internal = ServiceError::Internal("oops".to_string());

        assert_eq!(error_status(&database), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_status(&internal), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
