//! Submission processor: claims pending submissions with a lease and runs
//! them through the scoring oracle.
//!
//! Claiming flips `pending_review → scoring` with a visibility timeout
//! under `FOR UPDATE SKIP LOCKED`, so a slow oracle call cannot cause a
//! second poller run to pick up the same row. Rows whose lease expired
//! (crashed or stuck run) become claimable again, which is safe: scoring a
//! still-unscored row twice converges to the same verdict.

use std::time::Duration;

use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::idea::SubmissionStatus;
use crate::scoring::{IdeaSubmission, ScoringResult};
use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
const CLAIM_BATCH_SIZE: i64 = 5;
/// Visibility timeout: a claimed row not resolved within this window is
/// handed back to the queue.
const LEASE_MINUTES: i32 = 10;

const REPUTATION_PER_APPROVAL: i32 = 50;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimedSubmission {
    pub id: Uuid,
    pub title: String,
    pub teaser_description: String,
    pub full_description: String,
    pub category: String,
    pub contributor_id: Option<Uuid>,
}

/// Runs the polling loop forever.
pub async fn run(state: AppState) {
    info!("Starting submission processor...");
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;
        if let Err(e) = process_batch(&state).await {
            error!("Error in submission processor: {e}");
        }
    }
}

async fn process_batch(state: &AppState) -> Result<(), AppError> {
    let claimed = claim_batch(&state.db).await?;
    if claimed.is_empty() {
        return Ok(());
    }
    info!("Claimed {} pending submissions to process", claimed.len());

    for submission in claimed {
        process_submission(state, submission).await;
    }
    Ok(())
}

/// Atomically claims up to `CLAIM_BATCH_SIZE` rows, oldest first:
/// unclaimed `pending_review` rows plus `scoring` rows whose lease expired.
pub async fn claim_batch(db: &PgPool) -> Result<Vec<ClaimedSubmission>, AppError> {
    Ok(sqlx::query_as(
        "UPDATE ideas SET \
             submission_status = 'scoring', \
             lease_expires_at = now() + make_interval(mins => $1) \
         WHERE id IN ( \
             SELECT id FROM ideas \
             WHERE submission_status = 'pending_review' \
                OR (submission_status = 'scoring' AND lease_expires_at < now()) \
             ORDER BY created_at ASC \
             LIMIT $2 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING id, title, teaser_description, full_description, category, contributor_id",
    )
    .bind(LEASE_MINUTES)
    .bind(CLAIM_BATCH_SIZE)
    .fetch_all(db)
    .await?)
}

async fn process_submission(state: &AppState, claimed: ClaimedSubmission) {
    let idea_id = claimed.id;
    info!("Processing idea submission: {idea_id}");

    let submission = IdeaSubmission {
        title: claimed.title,
        teaser_description: claimed.teaser_description,
        full_description: claimed.full_description,
        category: claimed.category,
    };

    match state.scorer.score(&submission).await {
        Ok(result) => {
            if let Err(e) =
                record_verdict(&state.db, idea_id, claimed.contributor_id, &result).await
            {
                error!("Failed to record scoring verdict for {idea_id}: {e}");
            }
        }
        Err(e) => {
            warn!("Scoring oracle failed for {idea_id}: {e}");
            if let Err(e) = mark_failed(&state.db, idea_id).await {
                error!("Failed to mark idea {idea_id} as failed: {e}");
            }
        }
    }
}

/// Publishes or rejects the idea per the verdict, releasing the lease.
async fn record_verdict(
    db: &PgPool,
    idea_id: Uuid,
    contributor_id: Option<Uuid>,
    result: &ScoringResult,
) -> Result<(), AppError> {
    let mut tx = db.begin().await?;

    if result.approved {
        sqlx::query(
            "UPDATE ideas SET \
                 submission_status = $1, is_published = TRUE, published_at = now(), \
                 tier = $2, \
                 market_potential_score = $3, technical_feasibility_score = $4, \
                 innovation_score = $5, overall_score = $6, \
                 rejection_feedback = NULL, lease_expires_at = NULL, updated_at = now() \
             WHERE id = $7",
        )
        .bind(SubmissionStatus::Approved.as_str())
        .bind(result.tier.as_str())
        .bind(result.scores.market_potential)
        .bind(result.scores.technical_feasibility)
        .bind(result.scores.innovation)
        .bind(result.overall_score)
        .bind(idea_id)
        .execute(&mut *tx)
        .await?;

        if let Some(contributor) = contributor_id {
            sqlx::query(
                "UPDATE users SET reputation_score = reputation_score + $1, updated_at = now() \
                 WHERE id = $2",
            )
            .bind(REPUTATION_PER_APPROVAL)
            .bind(contributor)
            .execute(&mut *tx)
            .await?;
        }

        info!(
            "Idea {idea_id} approved and published (tier: {}, score: {})",
            result.tier.as_str(),
            result.overall_score
        );
    } else {
        let feedback = json!({
            "feedback": result.feedback,
            "scores": result.scores,
            "overall_score": result.overall_score,
        });

        sqlx::query(
            "UPDATE ideas SET \
                 submission_status = $1, is_published = FALSE, \
                 market_potential_score = $2, technical_feasibility_score = $3, \
                 innovation_score = $4, overall_score = $5, \
                 rejection_feedback = $6, lease_expires_at = NULL, updated_at = now() \
             WHERE id = $7",
        )
        .bind(SubmissionStatus::Rejected.as_str())
        .bind(result.scores.market_potential)
        .bind(result.scores.technical_feasibility)
        .bind(result.scores.innovation)
        .bind(result.overall_score)
        .bind(feedback)
        .bind(idea_id)
        .execute(&mut *tx)
        .await?;

        info!("Idea {idea_id} rejected (score: {})", result.overall_score);
    }

    tx.commit().await?;
    Ok(())
}

/// Marks a submission `failed` for manual review after an oracle failure.
async fn mark_failed(db: &PgPool, idea_id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE ideas SET \
             submission_status = $1, \
             rejection_feedback = $2, lease_expires_at = NULL, updated_at = now() \
         WHERE id = $3",
    )
    .bind(SubmissionStatus::Failed.as_str())
    .bind(json!({ "error": "Automated scoring failed. Manual review required." }))
    .bind(idea_id)
    .execute(db)
    .await?;
    Ok(())
}
