use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Tag;

/// Post entity - a blog article written by exactly one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(author_id: Uuid, title: String, content: String, tags: Vec<Tag>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            tags: dedup_by_slug(tags),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    pub fn has_tag(&self, slug: &str) -> bool {
        self.tags.iter().any(|t| t.slug == slug)
    }

    /// Replace the editable fields, keeping identity and creation time.
    pub fn revise(&mut self, title: String, content: String, tags: Vec<Tag>) {
        self.title = title;
        self.content = content;
        self.tags = dedup_by_slug(tags);
        self.updated_at = Utc::now();
    }

    /// Number of tags this post shares with `other`, compared by slug.
    pub fn shared_tag_count(&self, other: &Post) -> usize {
        self.tags.iter().filter(|t| other.has_tag(&t.slug)).count()
    }

    /// The text the full-text index is built from.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

fn dedup_by_slug(tags: Vec<Tag>) -> Vec<Tag> {
    let mut unique: Vec<Tag> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.iter().any(|t| t.slug == tag.slug) {
            unique.push(tag);
        }
    }
    unique
}
