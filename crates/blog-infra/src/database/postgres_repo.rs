//! PostgreSQL repository implementations for single-table entities.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use blog_core::domain::{Comment, User};
use blog_core::error::RepoError;
use blog_core::ports::{CommentFilter, CommentRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};
use crate::pii::mask_email;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(
        &self,
        post_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Comment>, RepoError> {
        let mut query = CommentEntity::find().filter(comment::Column::PostId.eq(post_id));
        if !include_inactive {
            query = query.filter(comment::Column::Active.eq(true));
        }

        let result = query
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list(&self, filter: &CommentFilter) -> Result<Vec<Comment>, RepoError> {
        tracing::debug!(active = ?filter.active, search = ?filter.search, "Listing comments");

        let mut query = CommentEntity::find();
        if let Some(active) = filter.active {
            query = query.filter(comment::Column::Active.eq(active));
        }
        if let Some(needle) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
            let mut any = Condition::any();
            for column in [
                comment::Column::Name,
                comment::Column::Email,
                comment::Column::Body,
            ] {
                any = any.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.as_str()));
            }
            query = query.filter(any);
        }

        let result = query
            .order_by_desc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
