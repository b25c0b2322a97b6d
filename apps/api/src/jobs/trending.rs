//! Hourly trending refresh. Best effort: a failed run leaves the previous
//! cache entry in place (or lets the next listing request recompute on
//! miss); it never takes the service down.

use std::time::Duration;

use tracing::{error, info};

use crate::ranking::trending::refresh_trending_cache;
use crate::state::AppState;

const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn run(state: AppState) {
    info!("Starting trending score updater...");
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        ticker.tick().await;
        match refresh_trending_cache(&state.redis, &state.db).await {
            Ok(()) => info!("Trending scores updated successfully"),
            Err(e) => error!("Error updating trending scores: {e:#}"),
        }
    }
}
