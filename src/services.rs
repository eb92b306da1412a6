use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::settings::Settings;

mod http;
mod mining;
mod rewards;
mod users;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Domain(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (mining_tx, mut mining_rx) = mpsc::channel(512);
    let (reward_tx, mut reward_rx) = mpsc::channel(512);

    let mut user_service = users::UserService::new();
    let mut mining_service = mining::MiningService::new();
    let mut reward_service = rewards::RewardService::new();

    println!("[*] Starting user service.");
    let user_pool_clone = pool.clone();
    tokio::spawn(async move {
        user_service
            .run(users::UserRequestHandler::new(user_pool_clone), &mut user_rx)
            .await;
    });

    println!("[*] Starting mining service.");
    let mining_pool_clone = pool.clone();
    tokio::spawn(async move {
        mining_service
            .run(
                mining::MiningRequestHandler::new(mining_pool_clone),
                &mut mining_rx,
            )
            .await;
    });

    log::info!("Starting reward service.");
    let reward_pool_clone = pool.clone();
    tokio::spawn(async move {
        reward_service
            .run(
                rewards::RewardRequestHandler::new(reward_pool_clone),
                &mut reward_rx,
            )
            .await;
    });

    println!("[SUCCESS] Started services.");

    println!("[*] Starting HTTP server.");
    http::start_http_server(&settings.server.listen, user_tx, mining_tx, reward_tx).await?;

    Ok(())
}
