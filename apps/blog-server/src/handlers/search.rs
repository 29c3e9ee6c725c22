//! Full-text search endpoint.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use blog_core::forms::SearchForm;
use blog_shared::dto::SearchResponse;

use super::views;
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// GET /api/search?query=
///
/// Without `query` the search box is simply shown empty; an empty `query`
/// is a validation error.
pub async fn search_posts(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> AppResult<HttpResponse> {
    let Some(query) = params.into_inner().query else {
        return Ok(HttpResponse::Ok().json(SearchResponse {
            query: None,
            results: Vec::new(),
        }));
    };

    let form = SearchForm { query };
    form.validate()?;

    let query = form.query.trim().to_string();
    let hits = state.posts.search(&query).await?;
    tracing::debug!(query = %query, hits = hits.len(), "Search executed");

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: Some(query),
        results: hits.iter().map(views::search_hit).collect(),
    }))
}
