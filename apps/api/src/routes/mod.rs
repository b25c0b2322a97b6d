pub mod earnings;
pub mod health;
pub mod interactions;
pub mod marketplace;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Marketplace
        .route(
            "/api/marketplace/ideas",
            get(marketplace::handle_list_ideas),
        )
        .route(
            "/api/marketplace/ideas/:slug",
            get(marketplace::handle_idea_detail),
        )
        .route("/api/ideas", post(marketplace::handle_submit_idea))
        .route("/api/ideas/:id/unlock", post(marketplace::handle_unlock_idea))
        .route(
            "/api/ideas/:id/service-purchase",
            post(marketplace::handle_service_purchase),
        )
        // Interactions
        .route("/api/ideas/:id/like", post(interactions::handle_toggle_like))
        .route(
            "/api/ideas/:id/bookmark",
            post(interactions::handle_toggle_bookmark),
        )
        .route(
            "/api/ideas/:id/comments",
            get(interactions::handle_list_comments).post(interactions::handle_create_comment),
        )
        .route(
            "/api/comments/:id",
            delete(interactions::handle_delete_comment),
        )
        .route("/api/ideas/:id/build", post(interactions::handle_create_build))
        // Earnings & payouts
        .route("/api/earnings", get(earnings::handle_get_earnings))
        .route("/api/payouts/request", post(earnings::handle_request_payout))
        .route("/api/payouts/history", get(earnings::handle_payout_history))
        .with_state(state)
}
