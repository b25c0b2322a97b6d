//! Ranking Component: orders the filtered idea set by one of four named
//! strategies and returns one page.
//!
//! `newest` and `top_rated` paginate store-side. `trending` and
//! `most_popular` must score the full filtered set in memory before
//! slicing, so page N+1 re-derives the ordering (no cursor state).

pub mod filters;
pub mod trending;

use std::cmp::Ordering;

use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::idea::IdeaSummaryRow;
use crate::models::pagination::{paginate_in_memory, Page, PageParams};
use filters::{IdeaFilters, SortStrategy};

/// A listing entry: the idea summary plus whichever derived score the
/// strategy produced, if any.
#[derive(Debug, Clone, Serialize)]
pub struct RankedIdea {
    #[serde(flatten)]
    pub idea: IdeaSummaryRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity_score: Option<i64>,
}

impl RankedIdea {
    fn plain(idea: IdeaSummaryRow) -> Self {
        Self {
            idea,
            trending_score: None,
            popularity_score: None,
        }
    }
}

/// Popularity: `views*1 + likes*2 + comments*3 + unlocks*5`. Computed per
/// request, never persisted.
pub fn popularity_score(idea: &IdeaSummaryRow) -> i64 {
    idea.view_count as i64
        + idea.like_count as i64 * 2
        + idea.comment_count as i64 * 3
        + idea.unlock_count as i64 * 5
}

const SUMMARY_COLUMNS: &str = "id, title, slug, teaser_description, category, tier, source, \
     contributor_id, overall_score, view_count, like_count, comment_count, \
     unlock_count, bookmark_count, build_count, unlock_price, published_at";

/// Shared predicate: published + approved, optional category, optional tier.
const FILTER_PREDICATE: &str = "is_published = TRUE AND submission_status = 'approved' \
     AND ($1::text IS NULL OR category = $1) \
     AND ($2::text IS NULL OR tier = $2)";

/// Entry point for idea listings.
pub async fn rank_ideas(
    db: &PgPool,
    redis: &redis::Client,
    filters: &IdeaFilters,
    sort: SortStrategy,
    params: PageParams,
) -> Result<Page<RankedIdea>, AppError> {
    let params = params.clamped();
    match sort {
        SortStrategy::Newest => {
            sql_ordered_page(db, filters, params, "published_at DESC NULLS LAST").await
        }
        SortStrategy::TopRated => {
            sql_ordered_page(db, filters, params, "overall_score DESC").await
        }
        SortStrategy::MostPopular => most_popular_page(db, filters, params).await,
        SortStrategy::Trending => trending_page(db, redis, filters, params).await,
    }
}

/// Store-side ORDER BY + LIMIT/OFFSET page for the two SQL-sortable
/// strategies. `order_by` is a compile-time constant from `rank_ideas`.
async fn sql_ordered_page(
    db: &PgPool,
    filters: &IdeaFilters,
    params: PageParams,
    order_by: &str,
) -> Result<Page<RankedIdea>, AppError> {
    let query = format!(
        "SELECT {SUMMARY_COLUMNS} FROM ideas WHERE {FILTER_PREDICATE} \
         ORDER BY {order_by} LIMIT $3 OFFSET $4"
    );

    let ideas: Vec<IdeaSummaryRow> = sqlx::query_as(&query)
        .bind(&filters.category)
        .bind(filters.tier.as_param())
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(db)
        .await?;

    let total = count_filtered(db, filters).await?;
    let items = ideas.into_iter().map(RankedIdea::plain).collect();
    Ok(Page::new(items, total, params))
}

async fn most_popular_page(
    db: &PgPool,
    filters: &IdeaFilters,
    params: PageParams,
) -> Result<Page<RankedIdea>, AppError> {
    let ideas = fetch_all_filtered(db, filters).await?;
    let total = ideas.len() as i64;

    let mut ranked: Vec<RankedIdea> = ideas
        .into_iter()
        .map(|idea| {
            let score = popularity_score(&idea);
            RankedIdea {
                idea,
                trending_score: None,
                popularity_score: Some(score),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.popularity_score.cmp(&a.popularity_score));

    Ok(Page::new(paginate_in_memory(ranked, params), total, params))
}

async fn trending_page(
    db: &PgPool,
    redis: &redis::Client,
    filters: &IdeaFilters,
    params: PageParams,
) -> Result<Page<RankedIdea>, AppError> {
    // A failed computation degrades to an empty map: every idea scores 0 and
    // the order falls back to fetch order rather than failing the request.
    let scores = trending::load_trending_scores(redis, db).await;

    let ideas = fetch_all_filtered(db, filters).await?;
    let total = ideas.len() as i64;

    let mut ranked: Vec<RankedIdea> = ideas
        .into_iter()
        .map(|idea| {
            let score = scores.get(&idea.id).copied().unwrap_or(0.0);
            RankedIdea {
                idea,
                trending_score: Some(score),
                popularity_score: None,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.trending_score
            .partial_cmp(&a.trending_score)
            .unwrap_or(Ordering::Equal)
    });

    Ok(Page::new(paginate_in_memory(ranked, params), total, params))
}

async fn fetch_all_filtered(
    db: &PgPool,
    filters: &IdeaFilters,
) -> Result<Vec<IdeaSummaryRow>, AppError> {
    let query = format!("SELECT {SUMMARY_COLUMNS} FROM ideas WHERE {FILTER_PREDICATE}");
    Ok(sqlx::query_as(&query)
        .bind(&filters.category)
        .bind(filters.tier.as_param())
        .fetch_all(db)
        .await?)
}

async fn count_filtered(db: &PgPool, filters: &IdeaFilters) -> Result<i64, AppError> {
    let query = format!("SELECT COUNT(*) FROM ideas WHERE {FILTER_PREDICATE}");
    Ok(sqlx::query_scalar(&query)
        .bind(&filters.category)
        .bind(filters.tier.as_param())
        .fetch_one(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn summary(views: i32, likes: i32, comments: i32, unlocks: i32) -> IdeaSummaryRow {
        IdeaSummaryRow {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            slug: "t".to_string(),
            teaser_description: "teaser".to_string(),
            category: "productivity".to_string(),
            tier: "regular".to_string(),
            source: "community".to_string(),
            contributor_id: None,
            overall_score: 0.8,
            view_count: views,
            like_count: likes,
            comment_count: comments,
            unlock_count: unlocks,
            bookmark_count: 0,
            build_count: 0,
            unlock_price: Decimal::ZERO,
            published_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_popularity_weights() {
        // (100, 10, 2, 1) -> 100 + 20 + 6 + 5 = 131
        assert_eq!(popularity_score(&summary(100, 10, 2, 1)), 131);
        // (50, 20, 5, 0) -> 50 + 40 + 15 + 0 = 105
        assert_eq!(popularity_score(&summary(50, 20, 5, 0)), 105);
    }

    #[test]
    fn test_popularity_ordering_scenario() {
        let a = summary(100, 10, 2, 1);
        let b = summary(50, 20, 5, 0);
        assert!(popularity_score(&a) > popularity_score(&b));
    }
}
