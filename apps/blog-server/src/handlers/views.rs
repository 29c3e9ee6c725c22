//! Domain to DTO conversions.

use blog_core::domain::{Comment, Post, Tag};
use blog_core::ports::CommentedPost;
use blog_core::query::{Page, SearchHit, SimilarPost};
use blog_shared::PageResponse;
use blog_shared::dto::{
    CommentResponse, CommentedPostResponse, PostResponse, SearchResultResponse,
    SimilarPostResponse, TagResponse,
};

pub fn tag(tag: &Tag) -> TagResponse {
    TagResponse {
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    }
}

pub fn post(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title.clone(),
        content: post.content.clone(),
        tags: post.tags.iter().map(tag).collect(),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

/// Commenter e-mail addresses are only shown to moderators.
pub fn comment(comment: &Comment, with_email: bool) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        name: comment.name.clone(),
        email: with_email.then(|| comment.email.clone()),
        body: comment.body.clone(),
        active: comment.active,
        created_at: comment.created_at.to_rfc3339(),
    }
}

pub fn similar(similar: &SimilarPost) -> SimilarPostResponse {
    SimilarPostResponse {
        post: post(&similar.post),
        shared_tags: similar.shared_tags,
    }
}

pub fn search_hit(hit: &SearchHit) -> SearchResultResponse {
    SearchResultResponse {
        post: post(&hit.post),
        rank: hit.rank,
    }
}

pub fn commented(entry: &CommentedPost) -> CommentedPostResponse {
    CommentedPostResponse {
        post: post(&entry.post),
        total_comments: entry.total_comments,
    }
}

pub fn post_page(page: Page<Post>) -> PageResponse<PostResponse> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    PageResponse {
        items: page.items.iter().map(post).collect(),
        page: page.page,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
        has_next,
        has_previous,
    }
}
