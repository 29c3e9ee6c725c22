//! Sidebar widgets.

use actix_web::{HttpResponse, web};

use blog_shared::dto::StatsResponse;

use super::views;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/stats
pub async fn blog_stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let listing = &state.config.listing;

    let total_posts = state.posts.count().await?;
    let latest = state.posts.latest(listing.latest_posts).await?;
    let most_commented = state
        .posts
        .most_commented(listing.most_commented_posts)
        .await?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        total_posts,
        latest_posts: latest.iter().map(views::post).collect(),
        most_commented: most_commented.iter().map(views::commented).collect(),
    }))
}
