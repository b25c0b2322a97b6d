//! Marketplace handlers: browse/rank listings, idea detail with premium
//! gating, submissions, and unlocks.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interactions::bump_view_count;
use crate::models::idea::{IdeaRow, IdeaSource, SubmissionStatus};
use crate::models::pagination::{Page, PageParams};
use crate::ranking::filters::{IdeaFilters, SortStrategy, TierFilter};
use crate::ranking::{rank_ideas, RankedIdea};
use crate::revenue::unlock::{process_idea_unlock, process_service_purchase, UnlockRevenue};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListIdeasQuery {
    #[serde(default)]
    pub sort: SortStrategy,
    pub category: Option<String>,
    #[serde(default)]
    pub tier: TierFilter,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/marketplace/ideas
pub async fn handle_list_ideas(
    State(state): State<AppState>,
    Query(query): Query<ListIdeasQuery>,
) -> Result<Json<Page<RankedIdea>>, AppError> {
    let filters = IdeaFilters {
        category: query.category,
        tier: query.tier,
    };
    let params = PageParams {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };
    let page = rank_ideas(&state.db, &state.redis, &filters, query.sort, params).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub user_id: Option<Uuid>,
}

/// GET /api/marketplace/ideas/:slug
///
/// Premium ideas hide the full description unless the requesting user has
/// unlocked them. The view counter bump is fire-and-forget.
pub async fn handle_idea_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<Value>, AppError> {
    let idea: Option<IdeaRow> = sqlx::query_as(
        "SELECT id, title, slug, teaser_description, full_description, category, tier, \
                source, contributor_id, submission_status, is_published, \
                market_potential_score, technical_feasibility_score, innovation_score, \
                overall_score, view_count, like_count, comment_count, unlock_count, \
                bookmark_count, build_count, unlock_price, published_at, created_at \
         FROM ideas WHERE slug = $1",
    )
    .bind(&slug)
    .fetch_optional(&state.db)
    .await?;

    let idea = match idea {
        Some(i) if i.is_published => i,
        _ => return Err(AppError::NotFound(format!("Idea '{slug}' not found"))),
    };

    bump_view_count(state.db.clone(), idea.id);

    let mut is_unlocked = !idea.is_premium();
    if let (false, Some(user_id)) = (is_unlocked, query.user_id) {
        let unlock: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM idea_unlocks WHERE user_id = $1 AND idea_id = $2",
        )
        .bind(user_id)
        .bind(idea.id)
        .fetch_optional(&state.db)
        .await?;
        is_unlocked = unlock.is_some();
    }

    // Serialize the full row, then redact the paid content for locked
    // premium ideas.
    let mut body = serde_json::to_value(&idea).map_err(anyhow::Error::from)?;
    if let Value::Object(map) = &mut body {
        if !is_unlocked {
            map.remove("full_description");
        }
        map.insert("is_unlocked".to_string(), Value::Bool(is_unlocked));
    }

    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct SubmitIdeaRequest {
    pub user_id: Uuid,
    pub title: String,
    pub teaser_description: String,
    pub full_description: String,
    pub category: String,
    pub unlock_price: Option<Decimal>,
}

/// POST /api/ideas
/// New submissions enter `pending_review`; the submission processor scores
/// and publishes (or rejects) them asynchronously.
pub async fn handle_submit_idea(
    State(state): State<AppState>,
    Json(req): Json<SubmitIdeaRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if req.full_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Full description is required".to_string(),
        ));
    }
    if let Some(price) = req.unlock_price {
        if price < Decimal::ZERO {
            return Err(AppError::Validation(
                "Unlock price cannot be negative".to_string(),
            ));
        }
    }

    let slug = unique_slug(&req.title);
    let idea_id: Uuid = sqlx::query_scalar(
        "INSERT INTO ideas \
             (title, slug, teaser_description, full_description, category, source, \
              contributor_id, submission_status, unlock_price) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(req.title.trim())
    .bind(&slug)
    .bind(req.teaser_description.trim())
    .bind(req.full_description.trim())
    .bind(&req.category)
    .bind(IdeaSource::Community.as_str())
    .bind(req.user_id)
    .bind(SubmissionStatus::PendingReview.as_str())
    .bind(req.unlock_price.unwrap_or(Decimal::ZERO))
    .fetch_one(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": idea_id,
            "slug": slug,
            "submission_status": SubmissionStatus::PendingReview,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub user_id: Uuid,
    pub stripe_payment_intent_id: Option<String>,
}

/// POST /api/ideas/:id/unlock
pub async fn handle_unlock_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<UnlockRevenue>, AppError> {
    let price: Option<Decimal> = sqlx::query_scalar("SELECT unlock_price FROM ideas WHERE id = $1")
        .bind(idea_id)
        .fetch_optional(&state.db)
        .await?;
    let price = price.ok_or_else(|| AppError::NotFound(format!("Idea {idea_id} not found")))?;

    let result = process_idea_unlock(
        &state.db,
        req.user_id,
        idea_id,
        price,
        req.stripe_payment_intent_id.as_deref(),
    )
    .await?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ServicePurchaseRequest {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub stripe_payment_intent_id: Option<String>,
}

/// POST /api/ideas/:id/service-purchase
pub async fn handle_service_purchase(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<ServicePurchaseRequest>,
) -> Result<Json<UnlockRevenue>, AppError> {
    let result = process_service_purchase(
        &state.db,
        req.user_id,
        idea_id,
        req.amount,
        req.stripe_payment_intent_id.as_deref(),
    )
    .await?;
    Ok(Json(result))
}

/// Lowercased, hyphenated slug with a short random suffix for uniqueness.
fn unique_slug(title: &str) -> String {
    let base: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let base: String = base
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", base, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_slug_shape() {
        let slug = unique_slug("My Great Idea!");
        assert!(slug.starts_with("my-great-idea-"));
        assert_eq!(slug.len(), "my-great-idea-".len() + 8);
    }

    #[test]
    fn test_unique_slug_collapses_punctuation() {
        let slug = unique_slug("AI -- powered   (meal) planner");
        assert!(slug.starts_with("ai-powered-meal-planner-"));
    }

    #[test]
    fn test_unique_slugs_differ() {
        assert_ne!(unique_slug("Same title"), unique_slug("Same title"));
    }
}
