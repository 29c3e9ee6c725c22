//! Post listings, detail page and authoring.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::domain::Post;
use blog_core::forms::PostForm;
use blog_core::query::PageRequest;
use blog_shared::dto::PostDetailResponse;

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// `?page=` query string. Anything that is not a positive integer selects page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self, per_page: u64) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(1);
        PageRequest::new(page, per_page)
    }
}

async fn load_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| {
            DomainError::NotFound {
                entity_type: "Post",
                id,
            }
            .into()
        })
}

/// Load a post the caller is allowed to modify.
async fn load_own_post(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<Post> {
    let post = load_post(state, id).await?;
    if !post.is_authored_by(identity.user_id) {
        tracing::debug!(post_id = %id, user_id = %identity.user_id, "Refused edit by non-author");
        return Err(DomainError::Forbidden("post").into());
    }
    Ok(post)
}

/// GET /api/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = query.request(state.config.listing.home_page_size);
    let page = state.posts.list(request).await?;
    Ok(HttpResponse::Ok().json(views::post_page(page)))
}

/// GET /api/tags/{slug}/posts
pub async fn list_posts_by_tag(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let request = query.request(state.config.listing.tag_page_size);
    let page = state.posts.list_by_tag(&slug, request).await?;
    Ok(HttpResponse::Ok().json(views::post_page(page)))
}

/// GET /api/users/{username}/posts
pub async fn list_posts_by_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    let request = query.request(state.config.listing.user_page_size);
    let page = state.posts.list_by_author(author.id, request).await?;
    Ok(HttpResponse::Ok().json(views::post_page(page)))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;

    let comments = state.comments.find_by_post(post.id, false).await?;
    let similar = state
        .posts
        .similar(&post, state.config.listing.similar_posts)
        .await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: views::post(&post),
        comments: comments.iter().map(|c| views::comment(c, false)).collect(),
        similar_posts: similar.iter().map(views::similar).collect(),
    }))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let post = Post::new(
        identity.user_id,
        form.title.trim().to_string(),
        form.content.trim().to_string(),
        form.tags(),
    );
    let post = state.posts.create(post).await?;

    tracing::info!(post_id = %post.id, author = %identity.username, "Post created");
    Ok(HttpResponse::Created().json(views::post(&post)))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = load_own_post(&state, &identity, path.into_inner()).await?;

    let form = body.into_inner();
    form.validate()?;

    post.revise(
        form.title.trim().to_string(),
        form.content.trim().to_string(),
        form.tags(),
    );
    let post = state.posts.update(post).await?;

    tracing::info!(post_id = %post.id, "Post updated");
    Ok(HttpResponse::Ok().json(views::post(&post)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_own_post(&state, &identity, path.into_inner()).await?;
    state.posts.delete(post.id).await?;

    tracing::info!(post_id = %post.id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}
