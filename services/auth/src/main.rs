use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use auth::{
    AppState, CredentialService,
    config::AuthConfig,
    identity::HttpIdentityProvider,
    jwt::TokenIssuer,
    notifier::RedisPublisher,
    routes,
};
use common::RedisPool;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting authentication service");

    let config = AuthConfig::from_env()?;

    // Initialize Redis connection pool
    let redis_pool = RedisPool::new(&config.redis).await?;
    if redis_pool.health_check().await? {
        info!("Redis connection successful");
    } else {
        anyhow::bail!("Failed to connect to Redis");
    }

    let token_issuer = TokenIssuer::new(config.jwt.clone())?;
    let identity = HttpIdentityProvider::new(&config.identity)?;
    info!("Using identity provider at {}", config.identity.base_url);

    let publisher = RedisPublisher::new(redis_pool.clone(), config.notification_exchange.clone());
    info!(
        "Publishing notifications under exchange {}",
        publisher.exchange()
    );

    let service = CredentialService::new(
        Arc::new(identity),
        Arc::new(publisher),
        token_issuer,
        Arc::new(redis_pool),
        config.confirmation_save_timeout,
    );

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Authentication service listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
