//! Contributor earnings and payout handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::revenue::PayoutRow;
use crate::revenue::earnings::{contributor_earnings, EarningsSummary};
use crate::revenue::payouts::{payout_history, request_payout, PayoutReceipt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/earnings
pub async fn handle_get_earnings(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<EarningsSummary>, AppError> {
    let summary = contributor_earnings(&state.db, params.user_id).await?;
    Ok(Json(summary))
}

/// POST /api/payouts/request
/// Pays out the entire available balance; partial payouts are unsupported.
pub async fn handle_request_payout(
    State(state): State<AppState>,
    Json(req): Json<UserIdQuery>,
) -> Result<Json<PayoutReceipt>, AppError> {
    let receipt = request_payout(&state.db, state.payouts.as_ref(), req.user_id).await?;
    Ok(Json(receipt))
}

/// GET /api/payouts/history
pub async fn handle_payout_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PayoutRow>>, AppError> {
    let payouts = payout_history(&state.db, params.user_id).await?;
    Ok(Json(payouts))
}
