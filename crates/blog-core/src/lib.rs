//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! Posts, tags and comments, the ports infrastructure must implement, and the
//! pure query logic behind listings, recommendations and full-text search.
//! This crate performs no I/O.

pub mod domain;
pub mod error;
pub mod forms;
pub mod ports;
pub mod query;
pub mod share;
pub mod slug;

pub use error::{DomainError, RepoError};
