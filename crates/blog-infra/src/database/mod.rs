//! PostgreSQL persistence via SeaORM.

mod connections;
mod post_repo;
mod postgres_base;
mod postgres_repo;

pub mod entity;

pub use connections::{DatabaseConfig, DatabasePool};
pub use post_repo::PostgresPostRepository;
pub use postgres_base::PostgresBaseRepository;
pub use postgres_repo::{PostgresCommentRepository, PostgresUserRepository};
