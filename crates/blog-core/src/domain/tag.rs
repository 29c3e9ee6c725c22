use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::slugify;

/// Tag entity - a short label with a unique, URL-safe slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Tag {
    /// Create a tag from a label, deriving its slug.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
        }
    }
}
