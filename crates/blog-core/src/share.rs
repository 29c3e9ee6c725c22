//! Composition of the "recommend this post" e-mail.

use uuid::Uuid;

use crate::domain::Post;
use crate::forms::EmailPostForm;
use crate::ports::OutgoingMail;

/// Public URL of a post's page under `base_url`.
pub fn post_url(base_url: &str, post_id: Uuid) -> String {
    format!("{}/post/{}/", base_url.trim_end_matches('/'), post_id)
}

/// Build the share message for `post` from a validated form.
pub fn compose_share_mail(post: &Post, post_url: &str, form: &EmailPostForm, sender: &str) -> OutgoingMail {
    let name = form.name.trim();
    OutgoingMail {
        subject: format!("{} recommends you read '{}'", name, post.title),
        body: format!(
            "Read {} at {}\n\n{}'s comments: {}",
            post.title,
            post_url,
            name,
            form.comments.trim()
        ),
        from: sender.to_string(),
        to: vec![form.to.trim().to_string()],
    }
}
