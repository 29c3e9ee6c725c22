//! "Recommend this post" by e-mail.

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::forms::EmailPostForm;
use blog_core::share::{compose_share_mail, post_url};
use blog_shared::dto::ShareResponse;

use crate::middleware::error::AppResult;
use crate::observability::RequestId;
use crate::state::AppState;

/// Base URL for links in outgoing mail: the configured public URL, or the
/// scheme and host this request arrived on.
fn base_url(state: &AppState, req: &HttpRequest) -> String {
    match &state.config.public_base_url {
        Some(url) => url.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}

/// POST /api/posts/{id}/share
pub async fn share_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    request_id: RequestId,
    path: web::Path<Uuid>,
    body: web::Json<EmailPostForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "Post",
            id: post_id,
        })?;

    let form = body.into_inner();
    form.validate()?;

    let url = post_url(&base_url(&state, &req), post.id);
    let mail = compose_share_mail(&post, &url, &form, &state.config.mail.from);

    if let Err(e) = state.mailer.send(&mail).await {
        tracing::warn!(
            request_id = %request_id.as_str(),
            post_id = %post.id,
            error = %e,
            "Share mail not delivered"
        );
        return Err(e.into());
    }

    tracing::info!(request_id = %request_id.as_str(), post_id = %post.id, "Post shared");
    Ok(HttpResponse::Ok().json(ShareResponse {
        post_id: post.id,
        sent: true,
    }))
}
