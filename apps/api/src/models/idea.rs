use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Submission lifecycle: `pending_review → scoring → approved | rejected |
/// failed`. `scoring` is the leased state while the oracle runs; a row stuck
/// there past its lease expiry is reclaimed by the submission processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingReview,
    Scoring,
    Approved,
    Rejected,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::PendingReview => "pending_review",
            SubmissionStatus::Scoring => "scoring",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaTier {
    Regular,
    Premium,
}

impl IdeaTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaTier::Regular => "regular",
            IdeaTier::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaSource {
    Ai,
    Community,
}

impl IdeaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaSource::Ai => "ai",
            IdeaSource::Community => "community",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdeaRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub teaser_description: String,
    pub full_description: String,
    pub category: String,
    pub tier: String,
    pub source: String,
    pub contributor_id: Option<Uuid>,
    pub submission_status: String,
    pub is_published: bool,
    pub market_potential_score: f64,
    pub technical_feasibility_score: f64,
    pub innovation_score: f64,
    pub overall_score: f64,
    pub view_count: i32,
    pub like_count: i32,
    pub comment_count: i32,
    pub unlock_count: i32,
    pub bookmark_count: i32,
    pub build_count: i32,
    pub unlock_price: Decimal,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl IdeaRow {
    pub fn is_premium(&self) -> bool {
        self.tier == IdeaTier::Premium.as_str()
    }
}

/// Projection used by the ranking queries: identity, counters, and the
/// fields the listing page renders. Cheaper than hauling full descriptions
/// through an in-memory sort.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdeaSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub teaser_description: String,
    pub category: String,
    pub tier: String,
    pub source: String,
    pub contributor_id: Option<Uuid>,
    pub overall_score: f64,
    pub view_count: i32,
    pub like_count: i32,
    pub comment_count: i32,
    pub unlock_count: i32,
    pub bookmark_count: i32,
    pub build_count: i32,
    pub unlock_price: Decimal,
    pub published_at: Option<DateTime<Utc>>,
}
