//! Comment submission and moderation.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::domain::Comment;
use blog_core::forms::CommentForm;
use blog_core::ports::CommentFilter;
use blog_shared::dto::SetCommentActiveRequest;

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{id}/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    if state.posts.find_by_id(post_id).await?.is_none() {
        return Err(DomainError::NotFound {
            entity_type: "Post",
            id: post_id,
        }
        .into());
    }

    let form = body.into_inner();
    form.validate()?;

    let comment = Comment::new(
        post_id,
        form.name.trim().to_string(),
        form.email.trim().to_string(),
        form.body.trim().to_string(),
    );
    let comment = state.comments.create(comment).await?;

    tracing::info!(
        comment_id = %comment.id,
        post_id = %post_id,
        user = %identity.username,
        "Comment added"
    );
    Ok(HttpResponse::Created().json(views::comment(&comment, false)))
}

/// Moderation listing filters: `?active=true|false&q=text`.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationQuery {
    pub active: Option<bool>,
    pub q: Option<String>,
}

impl From<ModerationQuery> for CommentFilter {
    fn from(query: ModerationQuery) -> Self {
        CommentFilter {
            active: query.active,
            search: query
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
        }
    }
}

/// GET /api/admin/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ModerationQuery>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;

    let filter = CommentFilter::from(query.into_inner());
    let comments = state.comments.list(&filter).await?;
    let body: Vec<_> = comments.iter().map(|c| views::comment(c, true)).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// PATCH /api/admin/comments/{id}
pub async fn set_comment_active(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<SetCommentActiveRequest>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;

    let id = path.into_inner();
    let mut comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "Comment",
            id,
        })?;

    comment.set_active(body.active);
    let comment = state.comments.update(comment).await?;

    tracing::info!(
        comment_id = %comment.id,
        active = comment.active,
        moderator = %identity.username,
        "Comment moderated"
    );
    Ok(HttpResponse::Ok().json(views::comment(&comment, true)))
}
