//! Payout requests: `pending → completed | failed`. A payout always takes
//! the entire available balance; partial payouts are not supported.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::revenue::{PayoutRow, PayoutStatus, TransactionType};
use crate::models::user::BalanceRow;
use crate::revenue::provider::{PayoutProvider, TransferRequest};

pub const MINIMUM_PAYOUT: Decimal = dec!(50.00);

#[derive(Debug, Clone, Serialize)]
pub struct PayoutReceipt {
    pub payout_id: Uuid,
    pub amount: Decimal,
    pub status: PayoutStatus,
    pub transfer_reference: Option<String>,
}

/// Rejects balances under the $50 minimum. Exactly $50.00 passes.
pub fn check_minimum_balance(available: Decimal) -> Result<(), AppError> {
    if available < MINIMUM_PAYOUT {
        return Err(AppError::InsufficientBalance(format!(
            "Minimum payout amount is ${MINIMUM_PAYOUT}. Your available balance is ${available}"
        )));
    }
    Ok(())
}

/// Requests a payout of the full available balance.
///
/// The payout row is created `pending` before the provider call. On
/// success, balance zeroing, the `completed` mark, and the ledger entry
/// commit together. On provider failure the payout is marked `failed` with
/// the reason and the balance is left untouched; the caller must re-request.
pub async fn request_payout(
    db: &PgPool,
    provider: &dyn PayoutProvider,
    user_id: Uuid,
) -> Result<PayoutReceipt, AppError> {
    let user: BalanceRow = sqlx::query_as(
        "SELECT id, username, available_balance, stripe_account_id FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    check_minimum_balance(user.available_balance)?;

    let destination = user
        .stripe_account_id
        .ok_or(AppError::PayoutAccountNotLinked)?;

    let amount = user.available_balance;

    let payout_id: Uuid = sqlx::query_scalar(
        "INSERT INTO payouts (user_id, amount, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(amount)
    .bind(PayoutStatus::Pending.as_str())
    .fetch_one(db)
    .await?;

    let transfer = provider
        .transfer(&TransferRequest {
            payout_id,
            destination,
            amount,
            description: format!("Payout for contributor earnings - {}", user.username),
        })
        .await;

    match transfer {
        Ok(reference) => {
            complete_payout(db, user_id, payout_id, amount, &reference).await?;
            info!("Payout completed for user {user_id}: ${amount}");
            Ok(PayoutReceipt {
                payout_id,
                amount,
                status: PayoutStatus::Completed,
                transfer_reference: Some(reference),
            })
        }
        Err(e) => {
            let reason = e.to_string();
            sqlx::query("UPDATE payouts SET status = $1, failure_reason = $2 WHERE id = $3")
                .bind(PayoutStatus::Failed.as_str())
                .bind(&reason)
                .bind(payout_id)
                .execute(db)
                .await?;
            error!("Payout failed for user {user_id}: {reason}");
            Err(AppError::Payment(reason))
        }
    }
}

/// Marks the payout completed, zeroes the balance, and appends the payout
/// ledger row, in one transaction.
async fn complete_payout(
    db: &PgPool,
    user_id: Uuid,
    payout_id: Uuid,
    amount: Decimal,
    reference: &str,
) -> Result<(), AppError> {
    let mut tx = db.begin().await?;

    sqlx::query(
        "UPDATE payouts SET status = $1, stripe_payout_id = $2, completed_at = $3 WHERE id = $4",
    )
    .bind(PayoutStatus::Completed.as_str())
    .bind(reference)
    .bind(Utc::now())
    .bind(payout_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET available_balance = 0, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO transactions (user_id, type, amount, description, reference_id, stripe_transaction_id) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(TransactionType::Payout.as_str())
    .bind(-amount)
    .bind("Payout to connected account")
    .bind(payout_id)
    .bind(reference)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn payout_history(db: &PgPool, user_id: Uuid) -> Result<Vec<PayoutRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM payouts WHERE user_id = $1 ORDER BY requested_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_rejects_just_under() {
        let err = check_minimum_balance(dec!(49.99)).unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance(_)));
    }

    #[test]
    fn test_minimum_accepts_exact_boundary() {
        assert!(check_minimum_balance(dec!(50.00)).is_ok());
        assert!(check_minimum_balance(dec!(50.01)).is_ok());
    }

    #[test]
    fn test_minimum_rejects_zero() {
        assert!(check_minimum_balance(Decimal::ZERO).is_err());
    }
}
