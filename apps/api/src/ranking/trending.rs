//! Trending score: a 7-day engagement window with per-day linear time decay.
//!
//! Day offset 0 is the most recent day; day `d` is weighted `1.0 - 0.1 * d`
//! (floored at 0). Per-day score is `views*1 + likes*3 + comments*5 +
//! unlocks*10`. Per-day view history is not tracked, so total views are
//! spread evenly across the window - a known approximation.
//!
//! Only ideas published within the trailing 7 days receive a score. The
//! whole-catalog `{idea_id -> score}` map is cached in Redis under one key
//! for an hour, so ordering can lag engagement by up to that much. The
//! refresh is not mutually exclusive: concurrent misses may both recompute
//! and both write, which is wasteful but safe (values are equivalent).

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const TRENDING_CACHE_KEY: &str = "trending_scores";
pub const TRENDING_CACHE_TTL_SECS: u64 = 3600;
pub const TRENDING_WINDOW_DAYS: i64 = 7;

const VIEW_WEIGHT: f64 = 1.0;
const LIKE_WEIGHT: f64 = 3.0;
const COMMENT_WEIGHT: f64 = 5.0;
const UNLOCK_WEIGHT: f64 = 10.0;

/// Engagement counts for one day of the window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyEngagement {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub unlocks: i64,
}

/// Linear decay weight for day offset `d`: 1.0, 0.9, ... floored at 0.
pub fn decay_weight(day: usize) -> f64 {
    (1.0 - 0.1 * day as f64).max(0.0)
}

/// Buckets event timestamps into day offsets from `now` and folds in the
/// evenly-distributed view count.
pub fn daily_engagement(
    view_count: i64,
    likes: &[DateTime<Utc>],
    comments: &[DateTime<Utc>],
    unlocks: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> [DailyEngagement; TRENDING_WINDOW_DAYS as usize] {
    let mut days = [DailyEngagement::default(); TRENDING_WINDOW_DAYS as usize];

    let views_per_day = view_count / TRENDING_WINDOW_DAYS;
    for day in days.iter_mut() {
        day.views = views_per_day;
    }

    let bucket = |ts: &DateTime<Utc>| -> Option<usize> {
        let age = now.signed_duration_since(*ts);
        let day = age.num_days();
        if (0..TRENDING_WINDOW_DAYS).contains(&day) {
            Some(day as usize)
        } else {
            None
        }
    };

    for ts in likes {
        if let Some(d) = bucket(ts) {
            days[d].likes += 1;
        }
    }
    for ts in comments {
        if let Some(d) = bucket(ts) {
            days[d].comments += 1;
        }
    }
    for ts in unlocks {
        if let Some(d) = bucket(ts) {
            days[d].unlocks += 1;
        }
    }

    days
}

/// Sums the decayed per-day scores over the window.
pub fn trending_score(days: &[DailyEngagement]) -> f64 {
    days.iter()
        .enumerate()
        .map(|(d, e)| {
            let day_score = e.views as f64 * VIEW_WEIGHT
                + e.likes as f64 * LIKE_WEIGHT
                + e.comments as f64 * COMMENT_WEIGHT
                + e.unlocks as f64 * UNLOCK_WEIGHT;
            day_score * decay_weight(d)
        })
        .sum()
}

/// Recomputes trending scores for every idea published within the window.
/// Ideas older than the window get no entry (implicitly 0).
pub async fn compute_trending_scores(pool: &PgPool) -> Result<HashMap<Uuid, f64>> {
    let now = Utc::now();
    let cutoff = now - Duration::days(TRENDING_WINDOW_DAYS);

    let ideas: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT id, view_count FROM ideas \
         WHERE is_published = TRUE AND published_at >= $1",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
    .context("fetching recently published ideas")?;

    let likes = recent_events(pool, "idea_likes", "created_at", cutoff).await?;
    let comments = recent_events(pool, "idea_comments", "created_at", cutoff).await?;
    let unlocks = recent_events(pool, "idea_unlocks", "unlocked_at", cutoff).await?;

    let empty: Vec<DateTime<Utc>> = Vec::new();
    let mut scores = HashMap::with_capacity(ideas.len());
    for (idea_id, view_count) in &ideas {
        let days = daily_engagement(
            *view_count as i64,
            likes.get(idea_id).unwrap_or(&empty),
            comments.get(idea_id).unwrap_or(&empty),
            unlocks.get(idea_id).unwrap_or(&empty),
            now,
        );
        scores.insert(*idea_id, trending_score(&days));
    }

    info!("Calculated trending scores for {} ideas", scores.len());
    Ok(scores)
}

async fn recent_events(
    pool: &PgPool,
    table: &str,
    ts_column: &str,
    cutoff: DateTime<Utc>,
) -> Result<HashMap<Uuid, Vec<DateTime<Utc>>>> {
    // Table and column names come from the three call sites above, never
    // from input.
    let query = format!("SELECT idea_id, {ts_column} FROM {table} WHERE {ts_column} >= $1");
    let rows: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(&query)
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .with_context(|| format!("fetching recent events from {table}"))?;

    let mut grouped: HashMap<Uuid, Vec<DateTime<Utc>>> = HashMap::new();
    for (idea_id, ts) in rows {
        grouped.entry(idea_id).or_default().push(ts);
    }
    Ok(grouped)
}

/// Returns the trending score map, from cache when fresh, recomputing and
/// repopulating on a miss. Any failure degrades to an empty map (all ideas
/// score 0) rather than failing the listing request.
pub async fn load_trending_scores(
    redis: &redis::Client,
    pool: &PgPool,
) -> HashMap<Uuid, f64> {
    match load_or_refresh(redis, pool).await {
        Ok(scores) => scores,
        Err(e) => {
            warn!("Trending score computation failed, returning empty map: {e:#}");
            HashMap::new()
        }
    }
}

async fn load_or_refresh(redis: &redis::Client, pool: &PgPool) -> Result<HashMap<Uuid, f64>> {
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .context("connecting to redis")?;

    let cached: Option<String> = conn.get(TRENDING_CACHE_KEY).await?;
    if let Some(json) = cached {
        debug!("Using cached trending scores");
        return serde_json::from_str(&json).context("decoding cached trending scores");
    }

    info!("Calculating fresh trending scores...");
    let scores = compute_trending_scores(pool).await?;

    let json = serde_json::to_string(&scores)?;
    conn.set_ex::<_, _, ()>(TRENDING_CACHE_KEY, json, TRENDING_CACHE_TTL_SECS)
        .await?;

    Ok(scores)
}

/// Forces a recompute and cache write, regardless of cache state. Used by
/// the hourly refresh job.
pub async fn refresh_trending_cache(redis: &redis::Client, pool: &PgPool) -> Result<()> {
    let scores = compute_trending_scores(pool).await?;
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .context("connecting to redis")?;
    let json = serde_json::to_string(&scores)?;
    conn.set_ex::<_, _, ()>(TRENDING_CACHE_KEY, json, TRENDING_CACHE_TTL_SECS)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_weight_table() {
        assert_eq!(decay_weight(0), 1.0);
        assert!((decay_weight(1) - 0.9).abs() < 1e-9);
        assert!((decay_weight(6) - 0.4).abs() < 1e-9);
        // Floor at 0 beyond day 9.
        assert_eq!(decay_weight(10), 0.0);
        assert_eq!(decay_weight(25), 0.0);
    }

    #[test]
    fn test_views_distributed_evenly() {
        let now = Utc::now();
        let days = daily_engagement(70, &[], &[], &[], now);
        for day in &days {
            assert_eq!(day.views, 10);
        }
        // Integer floor, remainder dropped.
        let days = daily_engagement(13, &[], &[], &[], now);
        for day in &days {
            assert_eq!(day.views, 1);
        }
    }

    #[test]
    fn test_events_bucketed_by_day_offset() {
        let now = Utc::now();
        let likes = vec![
            now - Duration::hours(2),          // day 0
            now - Duration::hours(30),         // day 1
            now - Duration::days(6),           // day 6
            now - Duration::days(8),           // outside window
        ];
        let days = daily_engagement(0, &likes, &[], &[], now);
        assert_eq!(days[0].likes, 1);
        assert_eq!(days[1].likes, 1);
        assert_eq!(days[6].likes, 1);
        let total: i64 = days.iter().map(|d| d.likes).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_score_applies_weights_and_decay() {
        // One like today (3.0 * 1.0) plus one unlock yesterday (10.0 * 0.9).
        let now = Utc::now();
        let likes = vec![now - Duration::hours(1)];
        let unlocks = vec![now - Duration::hours(26)];
        let days = daily_engagement(0, &likes, &[], &unlocks, now);
        let score = trending_score(&days);
        assert!((score - (3.0 + 9.0)).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_no_engagement_scores_zero() {
        let days = daily_engagement(0, &[], &[], &[], Utc::now());
        assert_eq!(trending_score(&days), 0.0);
    }

    #[test]
    fn test_views_alone_decay_across_window() {
        // 7 views -> 1 per day, weighted 1.0 + 0.9 + ... + 0.4 = 4.9.
        let days = daily_engagement(7, &[], &[], &[], Utc::now());
        let score = trending_score(&days);
        assert!((score - 4.9).abs() < 1e-9, "score was {score}");
    }
}
