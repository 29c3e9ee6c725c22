use async_trait::async_trait;
use uuid::Uuid;

use blog_core::domain::Comment;
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, CommentFilter, CommentRepository};

use super::MemoryStore;

/// In-memory comment repository.
pub struct InMemoryCommentRepository {
    store: MemoryStore,
}

impl InMemoryCommentRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.get(&id).cloned())
    }

    async fn create(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }

        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(stored) => {
                *stored = comment.clone();
                Ok(comment)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(
        &self,
        post_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && (include_inactive || c.active))
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn list(&self, filter: &CommentFilter) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::domain::Post;

    async fn store_with_post() -> (MemoryStore, Post) {
        let store = MemoryStore::default();
        let post = store
            .posts()
            .create(Post::new(Uuid::new_v4(), "T".into(), "C".into(), vec![]))
            .await
            .unwrap();
        (store, post)
    }

    #[tokio::test]
    async fn test_inactive_comment_hidden_but_listed_for_moderation() {
        let (store, post) = store_with_post().await;
        let repo = store.comments();

        let visible = repo
            .create(Comment::new(post.id, "Ann".into(), "ann@example.com".into(), "Hi".into()))
            .await
            .unwrap();
        let mut hidden = repo
            .create(Comment::new(post.id, "Bob".into(), "bob@example.com".into(), "Spam".into()))
            .await
            .unwrap();
        hidden.set_active(false);
        repo.update(hidden.clone()).await.unwrap();

        let public = repo.find_by_post(post.id, false).await.unwrap();
        assert_eq!(public, vec![visible]);

        let inactive = repo
            .list(&CommentFilter {
                active: Some(false),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, hidden.id);
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let repo = MemoryStore::default().comments();
        let err = repo
            .create(Comment::new(Uuid::new_v4(), "A".into(), "a@x.io".into(), "b".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }
}
