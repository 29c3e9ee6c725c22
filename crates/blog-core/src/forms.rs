//! User-submitted forms and their validation.
//!
//! Handlers deserialize these directly from request bodies and call
//! `validate()` before anything reaches a repository. Every failing rule is
//! reported, not just the first.

use serde::Deserialize;

use crate::domain::Tag;
use crate::error::DomainError;
use crate::slug::slugify;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_COMMENTER_NAME_LEN: usize = 80;
pub const MAX_SHARER_NAME_LEN: usize = 25;

/// Accumulates field errors.
#[derive(Debug, Default)]
struct Errors(Vec<String>);

impl Errors {
    fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.0.push(format!("{field} is required"));
            return false;
        }
        true
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.0.push(format!("{field} must be at most {max} characters"));
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if self.required(field, value) && !is_valid_email(value.trim()) {
            self.0.push(format!("{field} must be a valid email address"));
        }
    }

    fn finish(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.0))
        }
    }
}

/// Minimal syntactic check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Create/update form for posts.
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Errors::default();
        if errors.required("title", &self.title) {
            errors.max_len("title", self.title.trim(), MAX_TITLE_LEN);
        }
        errors.required("content", &self.content);
        for label in &self.tags {
            if slugify(label).is_empty() {
                errors.0.push(format!("tag '{label}' has no usable characters"));
            }
        }
        errors.finish()
    }

    /// Tags to attach. Duplicate slugs are collapsed by [`crate::domain::Post`].
    pub fn tags(&self) -> Vec<Tag> {
        self.tags.iter().map(|label| Tag::new(label)).collect()
    }
}

/// Comment submission form.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub name: String,
    pub email: String,
    pub body: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Errors::default();
        if errors.required("name", &self.name) {
            errors.max_len("name", self.name.trim(), MAX_COMMENTER_NAME_LEN);
        }
        errors.email("email", &self.email);
        errors.required("body", &self.body);
        errors.finish()
    }
}

/// "Recommend this post by e-mail" form.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailPostForm {
    pub name: String,
    pub email: String,
    pub to: String,
    #[serde(default)]
    pub comments: String,
}

impl EmailPostForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Errors::default();
        if errors.required("name", &self.name) {
            errors.max_len("name", self.name.trim(), MAX_SHARER_NAME_LEN);
        }
        errors.email("email", &self.email);
        errors.email("to", &self.to);
        errors.finish()
    }
}

/// Search box input.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchForm {
    pub query: String,
}

impl SearchForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Errors::default();
        errors.required("query", &self.query);
        errors.finish()
    }
}
