//! Query logic shared by every repository backend.
//!
//! Postgres pushes these computations into SQL; the in-memory store runs the
//! functions here directly. Both must agree on ordering and filtering.

pub mod pagination;
pub mod search;
pub mod similar;

pub use pagination::{Page, PageRequest};
pub use search::{SearchHit, SearchLanguage, SearchQuery, TextAnalyzer, rank_matches};
pub use similar::{SimilarPost, rank_similar};
