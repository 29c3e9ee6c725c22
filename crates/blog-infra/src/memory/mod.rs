//! In-memory repositories - used when no database is configured.
//!
//! All three repositories share one [`MemoryStore`], so comment counts and
//! tag lookups see the same data as post listings.
//! Note: Data is lost on process restart.

mod comments;
mod posts;
mod users;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, User};
use blog_core::query::{SearchLanguage, TextAnalyzer};

pub use comments::InMemoryCommentRepository;
pub use posts::InMemoryPostRepository;
pub use users::InMemoryUserRepository;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    /// All posts, newest first.
    fn posts_newest_first(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        posts
    }

    /// Reuse the stored identity of tags that already exist under the same slug.
    fn canonical_tags(&self, post: &mut Post) {
        for tag in &mut post.tags {
            let existing = self
                .posts
                .values()
                .flat_map(|p| p.tags.iter())
                .find(|t| t.slug == tag.slug);
            if let Some(existing) = existing {
                *tag = existing.clone();
            }
        }
        post.tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Shared in-memory storage behind the in-memory repositories.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    analyzer: Arc<TextAnalyzer>,
}

impl MemoryStore {
    pub fn new(language: SearchLanguage) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            analyzer: Arc::new(TextAnalyzer::new(language)),
        }
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository::new(self.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository::new(self.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository::new(self.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(SearchLanguage::default())
    }
}
