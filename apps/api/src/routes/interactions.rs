//! Interaction handlers: likes, bookmarks, comments, builds.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interactions::{
    create_comment, delete_comment, list_comments, record_build, toggle_bookmark, toggle_like,
};
use crate::models::interaction::{BuildRow, CommentRow, CommentThread};
use crate::models::pagination::{Page, PageParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

/// POST /api/ideas/:id/like
pub async fn handle_toggle_like(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<Value>, AppError> {
    let liked = toggle_like(&state.db, req.user_id, idea_id).await?;
    Ok(Json(json!({ "liked": liked })))
}

/// POST /api/ideas/:id/bookmark
pub async fn handle_toggle_bookmark(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<Value>, AppError> {
    let bookmarked = toggle_bookmark(&state.db, req.user_id, idea_id).await?;
    Ok(Json(json!({ "bookmarked": bookmarked })))
}

/// GET /api/ideas/:id/comments
pub async fn handle_list_comments(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<CommentThread>>, AppError> {
    let page = list_comments(&state.db, idea_id, params).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub user_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
}

/// POST /api/ideas/:id/comments
pub async fn handle_create_comment(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentRow>), AppError> {
    let comment =
        create_comment(&state.db, req.user_id, idea_id, &req.content, req.parent_id).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/comments/:id
pub async fn handle_delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<StatusCode, AppError> {
    delete_comment(&state.db, req.user_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CreateBuildRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// POST /api/ideas/:id/build
pub async fn handle_create_build(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<CreateBuildRequest>,
) -> Result<(StatusCode, Json<BuildRow>), AppError> {
    let build =
        record_build(&state.db, req.user_id, idea_id, req.title, req.description).await?;
    Ok((StatusCode::CREATED, Json(build)))
}
