//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;
mod search;
mod share;
mod stats;
mod views;

#[cfg(test)]
mod tests;

use actix_web::error::InternalError;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};

use blog_shared::ErrorResponse;

use crate::observability::RequestId;

/// 400 for bodies and query strings that do not deserialize, tagged with the
/// request ID so clients can quote it.
fn malformed_request<E>(err: E, req: &HttpRequest) -> actix_web::Error
where
    E: std::fmt::Display + std::fmt::Debug + 'static,
{
    let mut problem = ErrorResponse::bad_request(err.to_string());
    if let Some(id) = req.extensions().get::<RequestId>() {
        problem = problem.with_request_id(id.as_str());
    }
    InternalError::from_response(err, HttpResponse::BadRequest().json(problem)).into()
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(malformed_request))
        .app_data(web::QueryConfig::default().error_handler(malformed_request));

    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/search", web::get().to(search::search_posts))
            .route("/stats", web::get().to(stats::blog_stats))
            .route(
                "/tags/{slug}/posts",
                web::get().to(posts::list_posts_by_tag),
            )
            .route(
                "/users/{username}/posts",
                web::get().to(posts::list_posts_by_user),
            )
            // Posts
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/comments", web::post().to(comments::create_comment))
                    .route("/{id}/share", web::post().to(share::share_post)),
            )
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Moderation
            .service(
                web::scope("/admin")
                    .route("/comments", web::get().to(comments::list_comments))
                    .route(
                        "/comments/{id}",
                        web::patch().to(comments::set_comment_active),
                    ),
            ),
    );
}
