//! Social interactions: like/bookmark toggles, threaded comments, builds,
//! and best-effort view counting.
//!
//! Counter invariant: every counter on `ideas` equals the count of live
//! event rows, kept by moving the event row and the counter in the same
//! transaction. Views are the documented exception (fire-and-forget).

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interaction::{BuildRow, CommentRow, CommentThread};
use crate::models::pagination::{Page, PageParams};

pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Toggles a like. Returns the new state (true = liked).
///
/// The delete-first shape makes the toggle atomic without a pre-check: if a
/// row was deleted this request is an unlike, otherwise the insert either
/// succeeds or hits the unique key from a concurrent like (benign).
pub async fn toggle_like(db: &PgPool, user_id: Uuid, idea_id: Uuid) -> Result<bool, AppError> {
    ensure_idea_exists(db, idea_id).await?;

    let mut tx = db.begin().await?;

    let removed: Option<Uuid> = sqlx::query_scalar(
        "DELETE FROM idea_likes WHERE user_id = $1 AND idea_id = $2 RETURNING id",
    )
    .bind(user_id)
    .bind(idea_id)
    .fetch_optional(&mut *tx)
    .await?;

    let liked = if removed.is_some() {
        sqlx::query("UPDATE ideas SET like_count = like_count - 1 WHERE id = $1")
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;
        false
    } else {
        sqlx::query("INSERT INTO idea_likes (user_id, idea_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(idea_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Already liked"))?;
        sqlx::query("UPDATE ideas SET like_count = like_count + 1 WHERE id = $1")
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;
        true
    };

    tx.commit().await?;
    Ok(liked)
}

/// Toggles a bookmark. Returns the new state (true = bookmarked).
pub async fn toggle_bookmark(db: &PgPool, user_id: Uuid, idea_id: Uuid) -> Result<bool, AppError> {
    ensure_idea_exists(db, idea_id).await?;

    let mut tx = db.begin().await?;

    let removed: Option<Uuid> = sqlx::query_scalar(
        "DELETE FROM idea_bookmarks WHERE user_id = $1 AND idea_id = $2 RETURNING id",
    )
    .bind(user_id)
    .bind(idea_id)
    .fetch_optional(&mut *tx)
    .await?;

    let bookmarked = if removed.is_some() {
        sqlx::query("UPDATE ideas SET bookmark_count = bookmark_count - 1 WHERE id = $1")
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;
        false
    } else {
        sqlx::query("INSERT INTO idea_bookmarks (user_id, idea_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(idea_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Already bookmarked"))?;
        sqlx::query("UPDATE ideas SET bookmark_count = bookmark_count + 1 WHERE id = $1")
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;
        true
    };

    tx.commit().await?;
    Ok(bookmarked)
}

/// Validates comment content: non-empty after trimming, within the cap.
pub fn validate_comment(content: &str) -> Result<&str, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Comment content is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::Validation(format!(
            "Comment is too long (max {MAX_COMMENT_LENGTH} characters)"
        )));
    }
    Ok(trimmed)
}

/// Creates a comment. Only top-level comments move `comment_count`; replies
/// are threaded one level via `parent_id`, which must belong to this idea.
pub async fn create_comment(
    db: &PgPool,
    user_id: Uuid,
    idea_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> Result<CommentRow, AppError> {
    let content = validate_comment(content)?;
    ensure_idea_exists(db, idea_id).await?;

    if let Some(parent) = parent_id {
        let parent_idea: Option<Uuid> =
            sqlx::query_scalar("SELECT idea_id FROM idea_comments WHERE id = $1")
                .bind(parent)
                .fetch_optional(db)
                .await?;
        if parent_idea != Some(idea_id) {
            return Err(AppError::NotFound("Parent comment not found".to_string()));
        }
    }

    let mut tx = db.begin().await?;

    let comment: CommentRow = sqlx::query_as(
        "INSERT INTO idea_comments (user_id, idea_id, parent_id, content) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(idea_id)
    .bind(parent_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    if parent_id.is_none() {
        sqlx::query("UPDATE ideas SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(comment)
}

/// Whether a comment removal moves `comment_count`: only a row this call
/// actually deleted, and only a top-level one (replies never touch the
/// counter).
fn decrements_comment_count(removed: bool, parent_id: Option<Uuid>) -> bool {
    removed && parent_id.is_none()
}

/// Deletes a comment owned by `user_id`, decrementing the counter for
/// top-level comments.
pub async fn delete_comment(db: &PgPool, user_id: Uuid, comment_id: Uuid) -> Result<(), AppError> {
    let comment: Option<CommentRow> =
        sqlx::query_as("SELECT * FROM idea_comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(db)
            .await?;

    let comment =
        comment.ok_or_else(|| AppError::NotFound(format!("Comment {comment_id} not found")))?;

    if comment.user_id != user_id {
        return Err(AppError::Validation(
            "Not authorized to delete this comment".to_string(),
        ));
    }

    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM idea_comments WHERE parent_id = $1")
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

    // Delete-first shape, as in the toggles: the decrement is gated on this
    // delete returning a row, so a concurrent delete of the same comment
    // cannot decrement twice and drive the counter below the live-row count.
    let removed: Option<Uuid> = sqlx::query_scalar(
        "DELETE FROM idea_comments WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(comment_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    if decrements_comment_count(removed.is_some(), comment.parent_id) {
        sqlx::query("UPDATE ideas SET comment_count = comment_count - 1 WHERE id = $1")
            .bind(comment.idea_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Lists top-level comments newest-first with their replies, paginated.
pub async fn list_comments(
    db: &PgPool,
    idea_id: Uuid,
    params: PageParams,
) -> Result<Page<CommentThread>, AppError> {
    let params = params.clamped();

    let top_level: Vec<CommentRow> = sqlx::query_as(
        "SELECT * FROM idea_comments WHERE idea_id = $1 AND parent_id IS NULL \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(idea_id)
    .bind(params.limit)
    .bind(params.offset())
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM idea_comments WHERE idea_id = $1 AND parent_id IS NULL",
    )
    .bind(idea_id)
    .fetch_one(db)
    .await?;

    let parent_ids: Vec<Uuid> = top_level.iter().map(|c| c.id).collect();
    let replies: Vec<CommentRow> = sqlx::query_as(
        "SELECT * FROM idea_comments WHERE parent_id = ANY($1) ORDER BY created_at ASC",
    )
    .bind(&parent_ids)
    .fetch_all(db)
    .await?;

    let threads = top_level
        .into_iter()
        .map(|comment| {
            let replies = replies
                .iter()
                .filter(|r| r.parent_id == Some(comment.id))
                .cloned()
                .collect();
            CommentThread { comment, replies }
        })
        .collect();

    Ok(Page::new(threads, total, params))
}

/// Records that a user is building an idea. One build per (user, idea).
pub async fn record_build(
    db: &PgPool,
    user_id: Uuid,
    idea_id: Uuid,
    title: Option<String>,
    description: Option<String>,
) -> Result<BuildRow, AppError> {
    ensure_idea_exists(db, idea_id).await?;

    let mut tx = db.begin().await?;

    let build: BuildRow = sqlx::query_as(
        "INSERT INTO idea_builds (user_id, idea_id, title, description) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(idea_id)
    .bind(title)
    .bind(description)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "You are already building this idea"))?;

    sqlx::query("UPDATE ideas SET build_count = build_count + 1 WHERE id = $1")
        .bind(idea_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(build)
}

/// Best-effort view counting: spawned outside any transaction, errors
/// swallowed. View counts are eventual-consistency telemetry, not part of
/// the counter invariant.
pub fn bump_view_count(db: PgPool, idea_id: Uuid) {
    tokio::spawn(async move {
        let result = sqlx::query("UPDATE ideas SET view_count = view_count + 1 WHERE id = $1")
            .bind(idea_id)
            .execute(&db)
            .await;
        if let Err(e) = result {
            debug!("View count increment failed for {idea_id}: {e}");
        }
    });
}

async fn ensure_idea_exists(db: &PgPool, idea_id: Uuid) -> Result<(), AppError> {
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM ideas WHERE id = $1")
        .bind(idea_id)
        .fetch_optional(db)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Idea {idea_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_comment_trims() {
        assert_eq!(validate_comment("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn test_validate_comment_rejects_empty() {
        assert!(validate_comment("").is_err());
        assert!(validate_comment("   ").is_err());
    }

    #[test]
    fn test_validate_comment_rejects_over_limit() {
        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(validate_comment(&long).is_err());
        let at_limit = "x".repeat(MAX_COMMENT_LENGTH);
        assert!(validate_comment(&at_limit).is_ok());
    }

    #[test]
    fn test_comment_count_moves_only_for_removed_top_level() {
        assert!(decrements_comment_count(true, None));
        // Replies never touch the counter.
        assert!(!decrements_comment_count(true, Some(Uuid::new_v4())));
        // A concurrent delete that already removed the row must not
        // decrement again.
        assert!(!decrements_comment_count(false, None));
    }
}
