use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Comment, Post, User};
use crate::error::RepoError;
use crate::query::{Page, PageRequest, SearchHit, SimilarPost};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// A post together with how many comments it has.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentedPost {
    pub post: Post,
    pub total_comments: u64,
}

/// Post repository. Every listing is newest first.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn list(&self, page: PageRequest) -> Result<Page<Post>, RepoError>;

    /// Posts carrying the tag with exactly this slug.
    async fn list_by_tag(&self, slug: &str, page: PageRequest) -> Result<Page<Post>, RepoError>;

    async fn list_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// Up to `limit` other posts ranked by shared tag count.
    async fn similar(&self, post: &Post, limit: u64) -> Result<Vec<SimilarPost>, RepoError>;

    /// Full-text search over title and content, best match first.
    /// Blank queries return nothing.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;

    async fn latest(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    async fn most_commented(&self, limit: u64) -> Result<Vec<CommentedPost>, RepoError>;
}

/// Moderation listing filter. `None` fields do not restrict.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub active: Option<bool>,
    /// Case-insensitive text matched against name, email and body.
    pub search: Option<String>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.active.is_none_or(|active| comment.active == active)
            && self
                .search
                .as_deref()
                .is_none_or(|needle| comment.mentions(needle))
    }
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, oldest first.
    async fn find_by_post(
        &self,
        post_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Comment>, RepoError>;

    /// All comments matching `filter`, newest first.
    async fn list(&self, filter: &CommentFilter) -> Result<Vec<Comment>, RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(active: bool) -> Comment {
        let mut c = Comment::new(
            Uuid::new_v4(),
            "Ann".into(),
            "ann@example.com".into(),
            "Great write-up".into(),
        );
        c.set_active(active);
        c
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter = CommentFilter::default();
        assert!(filter.matches(&comment(true)));
        assert!(filter.matches(&comment(false)));
    }

    #[test]
    fn test_filter_by_active_and_text() {
        let hidden = comment(false);
        let filter = CommentFilter {
            active: Some(false),
            search: Some("WRITE-UP".into()),
        };
        assert!(filter.matches(&hidden));
        assert!(!filter.matches(&comment(true)));

        let by_email = CommentFilter {
            active: None,
            search: Some("example.com".into()),
        };
        assert!(by_email.matches(&hidden));

        let miss = CommentFilter {
            active: None,
            search: Some("bob".into()),
        };
        assert!(!miss.matches(&hidden));
    }
}
