//! Diana Bot API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use diana_api::config::{RewardsMode, ServerConfig};
use diana_api::error::AppError;
use diana_api::startup;
use diana_api::state::AppState;
use diana_core::clock::{Clock, SystemClock};
use diana_core::rewards::RewardGranter;
use diana_narrative::application::engine::NarrativeEngine;
use diana_store::pg_fragment_repository::PgFragmentRepository;
use diana_store::pg_progression_repository::PgProgressionRepository;
use diana_store::rewards::{LoggingRewardGranter, PgRewardOutbox};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Diana Bot API server");

    let config = ServerConfig::from_env()?;

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    diana_store::run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let fragments = Arc::new(PgFragmentRepository::new(pool.clone()));

    if let Some(path) = &config.catalog_path {
        let result = startup::publish_catalog_file(path, clock.as_ref(), fragments.as_ref()).await?;
        tracing::info!(
            fingerprint = %result.fingerprint,
            fragments = result.published,
            warnings = result.warnings.len(),
            "startup catalog published"
        );
    }

    let rewards: Arc<dyn RewardGranter> = match config.rewards {
        RewardsMode::Outbox => Arc::new(PgRewardOutbox::new(pool.clone())),
        RewardsMode::Log => Arc::new(LoggingRewardGranter),
    };

    let engine = NarrativeEngine::new(
        clock,
        fragments,
        Arc::new(PgProgressionRepository::new(pool)),
        rewards,
    );

    // TODO: Replace CorsLayer::permissive() with the bot front-end's origin once it is fixed.
    let app = diana_api::app(AppState::new(engine))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
