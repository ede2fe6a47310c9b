//! JSON response types shared by the API endpoints.
//!
//! Each struct is an explicit allow-list of the fields a client sees.

use quill_core::{CategoryWithCount, CommentView, PostSummary, ThreadComment};
use quill_db::entities::user;
use serde::Serialize;

/// `{success, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    /// Successful acknowledgement.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Message for a like toggle.
#[must_use]
pub const fn like_message(liked: bool) -> &'static str {
    if liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    }
}

/// User as returned by login and registration.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

/// The signed-in user's own profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub date_joined: String,
}

impl From<user::Model> for ProfileResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            is_staff: u.is_staff,
            date_joined: u.date_joined.to_rfc3339(),
        }
    }
}

/// Post in a public listing.
#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub author: String,
    pub category: Option<String>,
    pub featured_image: Option<String>,
    pub view_count: i32,
    pub like_count: i32,
    pub created_at: String,
}

impl From<PostSummary> for PostListItem {
    fn from(s: PostSummary) -> Self {
        let post = s.post;
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            author: s.author,
            category: s.category.map(|c| c.name),
            featured_image: post.featured_image_url,
            view_count: post.view_count,
            like_count: post.like_count,
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// Public listing page.
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostListItem>,
    pub total_pages: u64,
    pub current_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Published post with its approved comment thread.
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub category: Option<String>,
    pub featured_image: Option<String>,
    pub view_count: i32,
    pub like_count: i32,
    pub created_at: String,
    pub comments: Vec<ThreadCommentResponse>,
}

impl PostDetailResponse {
    /// Combine a summarized post with its thread.
    #[must_use]
    pub fn new(summary: PostSummary, comments: Vec<ThreadComment>) -> Self {
        let post = summary.post;
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            author: summary.author,
            category: summary.category.map(|c| c.name),
            featured_image: post.featured_image_url,
            view_count: post.view_count,
            like_count: post.like_count,
            created_at: post.created_at.to_rfc3339(),
            comments: comments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reply inside a thread.
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: String,
}

impl From<CommentView> for ReplyResponse {
    fn from(c: CommentView) -> Self {
        Self {
            id: c.comment.id,
            author: c.author,
            content: c.comment.content,
            created_at: c.comment.created_at.to_rfc3339(),
        }
    }
}

/// Top-level comment with its replies.
#[derive(Debug, Serialize)]
pub struct ThreadCommentResponse {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: String,
    pub replies: Vec<ReplyResponse>,
}

impl From<ThreadComment> for ThreadCommentResponse {
    fn from(t: ThreadComment) -> Self {
        let ReplyResponse {
            id,
            author,
            content,
            created_at,
        } = t.comment.into();
        Self {
            id,
            author,
            content,
            created_at,
            replies: t.replies.into_iter().map(Into::into).collect(),
        }
    }
}

/// Freshly submitted comment.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub author: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
}

impl From<CommentView> for CommentResponse {
    fn from(c: CommentView) -> Self {
        Self {
            id: c.comment.id,
            author: c.author,
            content: c.comment.content,
            status: c.comment.status.as_str().to_string(),
            created_at: c.comment.created_at.to_rfc3339(),
        }
    }
}

/// Category with its published post count.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub post_count: u64,
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(c: CategoryWithCount) -> Self {
        Self {
            id: c.category.id,
            name: c.category.name,
            slug: c.category.slug,
            description: c.category.description,
            post_count: c.post_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quill_db::entities::{comment, comment::CommentStatus};

    fn view(id: &str, author: &str) -> CommentView {
        CommentView {
            comment: comment::Model {
                id: id.to_string(),
                post_id: "p1".to_string(),
                author_id: "u1".to_string(),
                parent_id: None,
                content: "Nice".to_string(),
                status: CommentStatus::Pending,
                created_at: Utc::now().into(),
                updated_at: Utc::now().into(),
            },
            author: author.to_string(),
        }
    }

    #[test]
    fn test_thread_comment_keeps_replies() {
        let thread = ThreadComment {
            comment: view("c1", "alice"),
            replies: vec![view("c2", "bob")],
        };

        let response = ThreadCommentResponse::from(thread);
        assert_eq!(response.id, "c1");
        assert_eq!(response.author, "alice");
        assert_eq!(response.replies.len(), 1);
        assert_eq!(response.replies[0].author, "bob");
    }

    #[test]
    fn test_comment_response_status() {
        let response = CommentResponse::from(view("c1", "alice"));
        assert_eq!(response.status, "pending");
    }
}
