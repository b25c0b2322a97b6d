mod config;
mod db;
mod errors;
mod interactions;
mod jobs;
mod models;
mod ranking;
mod revenue;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::revenue::provider::{PayoutProvider, SimulatedPayoutProvider, StripeTransferProvider};
use crate::routes::build_router;
use crate::scoring::llm::LlmScorer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("ideamarket_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IdeaMarket API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (trending score cache)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize scoring oracle
    let scorer = Arc::new(LlmScorer::new(config.anthropic_api_key.clone()));
    info!("Scoring oracle initialized");

    // Payout provider: Stripe when configured, simulated otherwise
    let payouts: Arc<dyn PayoutProvider> = match &config.stripe_secret_key {
        Some(key) => {
            info!("Stripe payout provider initialized");
            Arc::new(StripeTransferProvider::new(key.clone()))
        }
        None => {
            info!("No Stripe key configured; payouts will be simulated");
            Arc::new(SimulatedPayoutProvider)
        }
    };

    // Build app state
    let state = AppState {
        db,
        redis,
        scorer,
        payouts,
    };

    // Background loops: submission scoring and hourly trending refresh
    tokio::spawn(jobs::submissions::run(state.clone()));
    tokio::spawn(jobs::trending::run(state.clone()));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
