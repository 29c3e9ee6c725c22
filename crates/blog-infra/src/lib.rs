//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//! This crate contains the database, in-memory store, auth and mail adapters.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external database, in-memory store only
//! - `postgres` - PostgreSQL database support via SeaORM

pub mod auth;
pub mod mail;
pub mod memory;
pub mod pii;

#[cfg(feature = "postgres")]
pub mod database;

// Re-exports - In-Memory
pub use memory::{
    InMemoryCommentRepository, InMemoryPostRepository, InMemoryUserRepository, MemoryStore,
};

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use mail::{LogMailer, WebhookMailer};

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, DatabasePool, PostgresCommentRepository, PostgresPostRepository,
    PostgresUserRepository,
};
