use std::cmp::Reverse;

use async_trait::async_trait;
use uuid::Uuid;

use blog_core::domain::Post;
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, CommentedPost, PostRepository};
use blog_core::query::{
    Page, PageRequest, SearchHit, SearchQuery, SimilarPost, rank_matches, rank_similar,
};

use super::MemoryStore;

/// In-memory post repository.
pub struct InMemoryPostRepository {
    store: MemoryStore,
}

impl InMemoryPostRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    async fn page_where<F>(&self, page: PageRequest, keep: F) -> Page<Post>
    where
        F: Fn(&Post) -> bool,
    {
        let tables = self.store.tables.read().await;
        let matching: Vec<Post> = tables
            .posts_newest_first()
            .into_iter()
            .filter(|p| keep(p))
            .collect();
        Page::from_ordered(matching, page)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn create(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        tables.canonical_tags(&mut post);
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }

        tables.canonical_tags(&mut post);
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        Ok(self.page_where(page, |_| true).await)
    }

    async fn list_by_tag(&self, slug: &str, page: PageRequest) -> Result<Page<Post>, RepoError> {
        Ok(self.page_where(page, |p| p.has_tag(slug)).await)
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        Ok(self.page_where(page, |p| p.is_authored_by(author_id)).await)
    }

    async fn similar(&self, post: &Post, limit: u64) -> Result<Vec<SimilarPost>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(rank_similar(
            post,
            tables.posts.values().cloned(),
            limit as usize,
        ))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RepoError> {
        let analyzer = &self.store.analyzer;
        let Some(query) = SearchQuery::parse(analyzer, query) else {
            return Ok(Vec::new());
        };
        tracing::debug!(terms = ?query.terms(), "In-memory search");

        let tables = self.store.tables.read().await;
        Ok(rank_matches(analyzer, &query, tables.posts.values().cloned()))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.store.tables.read().await.posts.len() as u64)
    }

    async fn latest(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts = tables.posts_newest_first();
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn most_commented(&self, limit: u64) -> Result<Vec<CommentedPost>, RepoError> {
        let tables = self.store.tables.read().await;

        let mut counted: Vec<CommentedPost> = tables
            .posts_newest_first()
            .into_iter()
            .map(|post| {
                let total_comments =
                    tables.comments.values().filter(|c| c.post_id == post.id).count() as u64;
                CommentedPost {
                    post,
                    total_comments,
                }
            })
            .collect();

        // Stable sort keeps newest-first among equal counts.
        counted.sort_by_key(|c| Reverse(c.total_comments));
        counted.truncate(limit as usize);
        Ok(counted)
    }
}
