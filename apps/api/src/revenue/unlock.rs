//! Premium unlock and service-purchase allocation. Each runs as one sqlx
//! transaction: event row, counter, ledger entries, and balance mutations
//! succeed or fail together.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::revenue::TransactionType;
use crate::revenue::{
    platform_only, split_revenue, RevenueSplit, REPUTATION_PER_SERVICE_PURCHASE,
    REPUTATION_PER_UNLOCK, SERVICE_CONTRIBUTOR_RATE, UNLOCK_CONTRIBUTOR_RATE,
};

#[derive(Debug, Clone, Serialize)]
pub struct UnlockRevenue {
    pub contributor_share: Decimal,
    pub platform_share: Decimal,
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UnlockTarget {
    title: String,
    tier: String,
    source: String,
    contributor_id: Option<Uuid>,
}

/// Allocates a premium unlock: unlock row, counter, buyer expense, and the
/// 60/40 contributor split where one exists, all-or-nothing.
///
/// A repeat unlock by the same (buyer, idea) pair hits the unique key and
/// surfaces as `Conflict` with no ledger or balance change. Uniqueness is
/// enforced by the constraint, not a pre-check, so concurrent attempts
/// cannot race past each other.
pub async fn process_idea_unlock(
    db: &PgPool,
    buyer_id: Uuid,
    idea_id: Uuid,
    amount: Decimal,
    external_ref: Option<&str>,
) -> Result<UnlockRevenue, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Payment amount must be positive".to_string(),
        ));
    }

    let idea = fetch_target(db, idea_id).await?;
    if idea.tier != "premium" {
        return Err(AppError::Validation("This idea is not premium".to_string()));
    }

    let mut tx = db.begin().await?;

    let unlock_id: Uuid = sqlx::query_scalar(
        "INSERT INTO idea_unlocks (user_id, idea_id, payment_amount, stripe_payment_intent_id) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(buyer_id)
    .bind(idea_id)
    .bind(amount)
    .bind(external_ref)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Idea already unlocked"))?;

    sqlx::query("UPDATE ideas SET unlock_count = unlock_count + 1 WHERE id = $1")
        .bind(idea_id)
        .execute(&mut *tx)
        .await?;

    // Buyer-side expense, always recorded.
    sqlx::query(
        "INSERT INTO transactions (user_id, type, amount, description, reference_id, stripe_transaction_id) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(buyer_id)
    .bind(TransactionType::IdeaUnlock.as_str())
    .bind(-amount)
    .bind(format!("Unlocked idea: {}", idea.title))
    .bind(idea_id)
    .bind(external_ref)
    .execute(&mut *tx)
    .await?;

    let result = match contributor_of(&idea) {
        Some(contributor_id) => {
            let split = split_revenue(amount, UNLOCK_CONTRIBUTOR_RATE);
            let tx_id = credit_contributor(
                &mut tx,
                contributor_id,
                &split,
                REPUTATION_PER_UNLOCK,
                format!("Earned from idea unlock: {}", idea.title),
                idea_id,
                external_ref,
            )
            .await?;
            info!(
                "Revenue allocated for idea {idea_id}: contributor {}, platform {}",
                split.contributor_share, split.platform_share
            );
            UnlockRevenue {
                contributor_share: split.contributor_share,
                platform_share: split.platform_share,
                transaction_id: tx_id,
            }
        }
        None => {
            let split = platform_only(amount);
            info!("AI idea {idea_id} unlocked: platform revenue {amount}");
            UnlockRevenue {
                contributor_share: split.contributor_share,
                platform_share: split.platform_share,
                transaction_id: unlock_id,
            }
        }
    };

    tx.commit().await?;
    Ok(result)
}

/// Service-purchase allocation: 30/70 split and a flat +25 reputation,
/// under the same atomicity contract. No unlock row is involved.
pub async fn process_service_purchase(
    db: &PgPool,
    buyer_id: Uuid,
    idea_id: Uuid,
    amount: Decimal,
    external_ref: Option<&str>,
) -> Result<UnlockRevenue, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Payment amount must be positive".to_string(),
        ));
    }

    let idea = fetch_target(db, idea_id).await?;

    let mut tx = db.begin().await?;

    let buyer_tx_id: Uuid = sqlx::query_scalar(
        "INSERT INTO transactions (user_id, type, amount, description, reference_id, stripe_transaction_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(buyer_id)
    .bind(TransactionType::ServicePurchase.as_str())
    .bind(-amount)
    .bind(format!("Service purchase for: {}", idea.title))
    .bind(idea_id)
    .bind(external_ref)
    .fetch_one(&mut *tx)
    .await?;

    let result = match contributor_of(&idea) {
        Some(contributor_id) => {
            let split = split_revenue(amount, SERVICE_CONTRIBUTOR_RATE);
            let tx_id = credit_contributor(
                &mut tx,
                contributor_id,
                &split,
                REPUTATION_PER_SERVICE_PURCHASE,
                format!("Earned from service purchase for: {}", idea.title),
                idea_id,
                external_ref,
            )
            .await?;
            info!(
                "Service revenue allocated for idea {idea_id}: contributor {}, platform {}",
                split.contributor_share, split.platform_share
            );
            UnlockRevenue {
                contributor_share: split.contributor_share,
                platform_share: split.platform_share,
                transaction_id: tx_id,
            }
        }
        None => {
            let split = platform_only(amount);
            UnlockRevenue {
                contributor_share: split.contributor_share,
                platform_share: split.platform_share,
                transaction_id: buyer_tx_id,
            }
        }
    };

    tx.commit().await?;
    Ok(result)
}

async fn fetch_target(db: &PgPool, idea_id: Uuid) -> Result<UnlockTarget, AppError> {
    sqlx::query_as::<_, UnlockTarget>(
        "SELECT title, tier, source, contributor_id FROM ideas WHERE id = $1",
    )
    .bind(idea_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Idea {idea_id} not found")))
}

fn contributor_of(idea: &UnlockTarget) -> Option<Uuid> {
    if idea.source == "community" {
        idea.contributor_id
    } else {
        None
    }
}

/// Credits the contributor inside the caller's transaction: balances,
/// reputation, and the earning ledger row. Returns the ledger row id.
async fn credit_contributor(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    contributor_id: Uuid,
    split: &RevenueSplit,
    reputation_bonus: i32,
    description: String,
    idea_id: Uuid,
    external_ref: Option<&str>,
) -> Result<Uuid, AppError> {
    sqlx::query(
        "UPDATE users SET \
             total_earnings = total_earnings + $1, \
             available_balance = available_balance + $1, \
             reputation_score = reputation_score + $2, \
             updated_at = now() \
         WHERE id = $3",
    )
    .bind(split.contributor_share)
    .bind(reputation_bonus)
    .bind(contributor_id)
    .execute(&mut **tx)
    .await?;

    let tx_id: Uuid = sqlx::query_scalar(
        "INSERT INTO transactions (user_id, type, amount, description, reference_id, stripe_transaction_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(contributor_id)
    .bind(TransactionType::ContributorEarning.as_str())
    .bind(split.contributor_share)
    .bind(description)
    .bind(idea_id)
    .bind(external_ref)
    .fetch_one(&mut **tx)
    .await?;

    Ok(tx_id)
}
