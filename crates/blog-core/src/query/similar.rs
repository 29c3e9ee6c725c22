use std::cmp::Reverse;

use serde::Serialize;

use crate::domain::Post;

/// A recommended post and the number of tags it shares with the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPost {
    pub post: Post,
    pub shared_tags: u64,
}

/// Rank `candidates` by the number of tags they share with `target`.
///
/// The target itself and posts sharing no tag are dropped. Ties go to the
/// newer post. At most `limit` entries are returned.
pub fn rank_similar<I>(target: &Post, candidates: I, limit: usize) -> Vec<SimilarPost>
where
    I: IntoIterator<Item = Post>,
{
    if target.tags.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<SimilarPost> = candidates
        .into_iter()
        .filter(|p| p.id != target.id)
        .filter_map(|post| {
            let shared = target.shared_tag_count(&post) as u64;
            (shared > 0).then_some(SimilarPost {
                post,
                shared_tags: shared,
            })
        })
        .collect();

    ranked.sort_by_key(|s| (Reverse(s.shared_tags), Reverse(s.post.created_at)));
    ranked.truncate(limit);
    ranked
}
