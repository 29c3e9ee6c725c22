//! PostgreSQL post repository: tag links, listings, recommendations and
//! full-text search.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbConn, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    Statement, TransactionTrait, Value,
};
use uuid::Uuid;

use blog_core::domain::Post;
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, CommentedPost, PostRepository};
use blog_core::query::{Page, PageRequest, SearchHit, SearchLanguage, SimilarPost};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::postgres_base::{query_error, write_error};

const SIMILAR_POSTS_SQL: &str = r#"
    SELECT p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at,
           COUNT(pt.tag_id) AS total
    FROM posts p
    JOIN post_tags pt ON pt.post_id = p.id
    WHERE pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = $1)
      AND p.id <> $1
    GROUP BY p.id
    ORDER BY total DESC, p.created_at DESC
    LIMIT $2
"#;

const MOST_COMMENTED_SQL: &str = r#"
    SELECT p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at,
           COUNT(c.id) AS total
    FROM posts p
    LEFT JOIN comments c ON c.post_id = p.id
    GROUP BY p.id
    ORDER BY total DESC, p.created_at DESC
    LIMIT $1
"#;

/// Post row plus an aggregate count.
#[derive(Debug, FromQueryResult)]
struct CountedPostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
    total: i64,
}

/// Post row plus its full-text relevance.
#[derive(Debug, FromQueryResult)]
struct RankedPostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
    rank: f32,
}

macro_rules! post_model {
    ($row:expr) => {
        post::Model {
            id: $row.id,
            author_id: $row.author_id,
            title: $row.title,
            content: $row.content,
            created_at: $row.created_at,
            updated_at: $row.updated_at,
        }
    };
}

/// PostgreSQL post repository.
///
/// Search runs under a single text search configuration fixed at
/// construction time.
pub struct PostgresPostRepository {
    db: DbConn,
    language: SearchLanguage,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn, language: SearchLanguage) -> Self {
        Self { db, language }
    }

    /// Tags of each post in `post_ids`, sorted by name.
    async fn load_tags<C>(db: &C, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<tag::Model>>, DbErr>
    where
        C: ConnectionTrait,
    {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = PostTagEntity::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .all(db)
            .await?;
        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let mut tag_ids: Vec<Uuid> = links.iter().map(|l| l.tag_id).collect();
        tag_ids.sort_unstable();
        tag_ids.dedup();

        let tags: HashMap<Uuid, tag::Model> = TagEntity::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut by_post: HashMap<Uuid, Vec<tag::Model>> = HashMap::new();
        for link in links {
            if let Some(tag) = tags.get(&link.tag_id) {
                by_post.entry(link.post_id).or_default().push(tag.clone());
            }
        }
        for tags in by_post.values_mut() {
            tags.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(by_post)
    }

    /// Attach tags to post rows, preserving row order.
    async fn with_tags(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut tags = Self::load_tags(&self.db, &ids).await.map_err(query_error)?;

        Ok(models
            .into_iter()
            .map(|m| {
                let post_tags = tags.remove(&m.id).unwrap_or_default();
                post::into_domain(m, post_tags)
            })
            .collect())
    }

    async fn paginate(
        &self,
        select: Select<PostEntity>,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let paginator = select
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, page.per_page);

        let total = paginator.num_items().await.map_err(query_error)?;
        // Past the end: skip the fetch so huge page numbers never reach OFFSET.
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let models = paginator
            .fetch_page(page.index())
            .await
            .map_err(query_error)?;

        Ok(Page::new(self.with_tags(models).await?, page, total))
    }

    /// Replace the post's tag links, creating missing tags by slug.
    async fn sync_tags<C>(db: &C, post: &Post) -> Result<Vec<tag::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post.id))
            .exec(db)
            .await?;

        let mut stored = Vec::with_capacity(post.tags.len());
        for tag in &post.tags {
            TagEntity::insert(tag::ActiveModel::from(tag))
                .on_conflict(OnConflict::column(tag::Column::Slug).do_nothing().to_owned())
                .exec_without_returning(db)
                .await?;

            let model = TagEntity::find()
                .filter(tag::Column::Slug.eq(tag.slug.as_str()))
                .one(db)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("tag '{}'", tag.slug)))?;
            stored.push(model);
        }

        if !stored.is_empty() {
            let links = stored.iter().map(|t| post_tag::ActiveModel {
                post_id: Set(post.id),
                tag_id: Set(t.id),
            });
            PostTagEntity::insert_many(links)
                .exec_without_returning(db)
                .await?;
        }

        stored.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stored)
    }

    async fn save(&self, post: Post, is_new: bool) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(query_error)?;

        let active_model = post::ActiveModel::from(&post);
        let model = if is_new {
            active_model.insert(&txn).await
        } else {
            active_model.update(&txn).await
        }
        .map_err(write_error)?;

        let tags = Self::sync_tags(&txn, &post).await.map_err(write_error)?;
        txn.commit().await.map_err(write_error)?;

        tracing::debug!(post_id = %model.id, tags = tags.len(), is_new, "Post saved");
        Ok(post::into_domain(model, tags))
    }

    async fn counted_posts(&self, stmt: Statement) -> Result<Vec<(Post, u64)>, RepoError> {
        let rows = CountedPostRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        let totals: Vec<u64> = rows.iter().map(|r| r.total.max(0) as u64).collect();
        let models = rows.into_iter().map(|r| post_model!(r)).collect();
        let posts = self.with_tags(models).await?;

        Ok(posts.into_iter().zip(totals).collect())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        Ok(self.with_tags(vec![model]).await?.pop())
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        self.save(post, true).await
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        self.save(post, false).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        self.paginate(PostEntity::find(), page).await
    }

    async fn list_by_tag(&self, slug: &str, page: PageRequest) -> Result<Page<Post>, RepoError> {
        tracing::debug!(slug, page = page.page, "Listing posts by tag");

        let select = PostEntity::find()
            .inner_join(TagEntity)
            .filter(tag::Column::Slug.eq(slug));
        self.paginate(select, page).await
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let select = PostEntity::find().filter(post::Column::AuthorId.eq(author_id));
        self.paginate(select, page).await
    }

    async fn similar(&self, target: &Post, limit: u64) -> Result<Vec<SimilarPost>, RepoError> {
        if target.tags.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            SIMILAR_POSTS_SQL,
            [Value::from(target.id), Value::from(limit as i64)],
        );

        Ok(self
            .counted_posts(stmt)
            .await?
            .into_iter()
            .map(|(post, shared_tags)| SimilarPost { post, shared_tags })
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RepoError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(query, language = %self.language, "Full-text search");

        // The configuration is inlined so the planner can use the expression index.
        let config = self.language.regconfig();
        let sql = format!(
            r#"
            SELECT p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at,
                   ts_rank(
                       to_tsvector('{config}', p.title || ' ' || p.content),
                       plainto_tsquery('{config}', $1)
                   ) AS rank
            FROM posts p
            WHERE to_tsvector('{config}', p.title || ' ' || p.content)
                  @@ plainto_tsquery('{config}', $1)
            ORDER BY rank DESC, p.created_at DESC
            "#
        );
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [Value::from(query)]);

        let rows = RankedPostRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        let ranks: Vec<f32> = rows.iter().map(|r| r.rank).collect();
        let models = rows.into_iter().map(|r| post_model!(r)).collect();
        let posts = self.with_tags(models).await?;

        Ok(posts
            .into_iter()
            .zip(ranks)
            .map(|(post, rank)| SearchHit { post, rank })
            .collect())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        PostEntity::find()
            .count(&self.db)
            .await
            .map_err(query_error)
    }

    async fn latest(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        self.with_tags(models).await
    }

    async fn most_commented(&self, limit: u64) -> Result<Vec<CommentedPost>, RepoError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            MOST_COMMENTED_SQL,
            [Value::from(limit as i64)],
        );

        Ok(self
            .counted_posts(stmt)
            .await?
            .into_iter()
            .map(|(post, total_comments)| CommentedPost {
                post,
                total_comments,
            })
            .collect())
    }
}
