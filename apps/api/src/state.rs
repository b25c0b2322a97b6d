use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::revenue::provider::PayoutProvider;
use crate::scoring::IdeaScorer;

/// Shared application state injected into all route handlers via Axum
/// extractors and into the background jobs. All dependencies are passed in
/// here explicitly; no module holds its own connection.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis holds the trending score cache (one key, 1-hour expiry).
    pub redis: RedisClient,
    /// Pluggable submission scorer. Default: LLM-backed via `LlmScorer`.
    pub scorer: Arc<dyn IdeaScorer>,
    /// Pluggable payout provider. Stripe when configured, simulated otherwise.
    pub payouts: Arc<dyn PayoutProvider>,
}
