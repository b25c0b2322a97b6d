use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::revenue::{PayoutRow, TransactionRow};

#[derive(Debug, Clone, Serialize)]
pub struct EarningsSummary {
    pub total_earnings: Decimal,
    pub available_balance: Decimal,
    /// Sum of payouts still in flight (requested but not completed).
    pub pending_balance: Decimal,
    pub transactions: Vec<TransactionRow>,
    pub payouts: Vec<PayoutRow>,
}

/// Earnings summary for a contributor: balances, pending payouts, and the
/// recent earning/payout ledger slice.
pub async fn contributor_earnings(db: &PgPool, user_id: Uuid) -> Result<EarningsSummary, AppError> {
    let balances: Option<(Decimal, Decimal)> =
        sqlx::query_as("SELECT total_earnings, available_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;

    let (total_earnings, available_balance) =
        balances.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let transactions: Vec<TransactionRow> = sqlx::query_as(
        "SELECT * FROM transactions \
         WHERE user_id = $1 AND type IN ('contributor_earning', 'payout') \
         ORDER BY created_at DESC LIMIT 50",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let payouts: Vec<PayoutRow> = sqlx::query_as(
        "SELECT * FROM payouts WHERE user_id = $1 ORDER BY requested_at DESC LIMIT 20",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let pending_balance: Option<Decimal> = sqlx::query_scalar(
        "SELECT SUM(amount) FROM payouts WHERE user_id = $1 AND status = 'pending'",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(EarningsSummary {
        total_earnings,
        available_balance,
        pending_balance: pending_balance.unwrap_or(Decimal::ZERO),
        transactions,
        payouts,
    })
}
