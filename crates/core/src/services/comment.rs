//! Comment service: submission, threads and moderation.

use std::collections::HashMap;

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::{comment, comment::CommentStatus, post, user},
    repositories::{CommentQuery, CommentRepository, PostRepository, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;
use tracing::info;

use crate::query::{PageRequest, Paginated};
use crate::services::post::ANY;
use crate::text::non_blank;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// A moderation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Approve,
    Reject,
}

impl Moderation {
    #[must_use]
    pub const fn status(self) -> CommentStatus {
        match self {
            Self::Approve => CommentStatus::Approved,
            Self::Reject => CommentStatus::Rejected,
        }
    }

    /// Past tense, for messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

/// A comment with its author's username.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: String,
}

/// A top-level comment and its approved replies.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadComment {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// A comment in the moderation listing.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationItem {
    #[serde(flatten)]
    pub comment: CommentView,
    pub post_title: String,
    pub post_slug: String,
}

/// Moderation queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    /// Comments matching the current filters.
    pub filtered: u64,
}

/// Filters of the moderation listing, straight from the query string.
#[derive(Debug, Clone, Default)]
pub struct CommentFilters {
    pub search: Option<String>,
    /// A status name, or `all`.
    pub status: Option<String>,
    /// A post id, or `all`.
    pub post_id: Option<String>,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn with_authors(&self, comments: Vec<comment::Model>) -> AppResult<Vec<CommentView>> {
        let mut ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let names: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                author: names.get(&comment.author_id).cloned().unwrap_or_default(),
                comment,
            })
            .collect())
    }

    /// Submit a comment or a reply. New comments await moderation.
    ///
    /// `post` must already be known to be published.
    pub async fn add(
        &self,
        post: &post::Model,
        author: &user::Model,
        content: &str,
        parent_id: Option<&str>,
    ) -> AppResult<CommentView> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment content cannot be empty.".to_string(),
            ));
        }

        let parent_id = match non_blank(parent_id) {
            Some(id) => {
                let parent = self
                    .comment_repo
                    .find_by_id(id)
                    .await?
                    .filter(|parent| parent.post_id == post.id)
                    .ok_or_else(|| AppError::NotFound(format!("Comment: {id}")))?;
                Some(parent.id)
            }
            None => None,
        };

        let now = chrono::Utc::now();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(author.id.clone()),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            status: Set(CommentStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let comment = self.comment_repo.create(model).await?;
        info!(
            comment_id = %comment.id,
            post_id = %post.id,
            user_id = %author.id,
            "Comment submitted"
        );

        Ok(CommentView {
            comment,
            author: author.username.clone(),
        })
    }

    /// Approved top-level comments with their approved replies, oldest first.
    pub async fn approved_thread(&self, post_id: &str) -> AppResult<Vec<ThreadComment>> {
        let top = self.comment_repo.approved_top_level(post_id).await?;
        let parent_ids: Vec<String> = top.iter().map(|c| c.id.clone()).collect();
        let replies = self.comment_repo.approved_replies(&parent_ids).await?;

        let top = self.with_authors(top).await?;
        let mut by_parent: HashMap<String, Vec<CommentView>> = HashMap::new();
        for reply in self.with_authors(replies).await? {
            if let Some(parent) = reply.comment.parent_id.clone() {
                by_parent.entry(parent).or_default().push(reply);
            }
        }

        Ok(top
            .into_iter()
            .map(|comment| ThreadComment {
                replies: by_parent.remove(&comment.comment.id).unwrap_or_default(),
                comment,
            })
            .collect())
    }

    /// Every comment of a post regardless of status, newest first.
    pub async fn all_for_post(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        self.with_authors(comments).await
    }

    /// Approve or reject one comment. Repeating a decision is harmless.
    ///
    /// With `post_id`, the comment must belong to that post.
    pub async fn moderate(
        &self,
        post_id: Option<&str>,
        comment_id: &str,
        decision: Moderation,
    ) -> AppResult<comment::Model> {
        let mut comment = self
            .comment_repo
            .find_by_id(comment_id)
            .await?
            .filter(|c| post_id.is_none_or(|p| c.post_id == p))
            .ok_or_else(|| AppError::NotFound(format!("Comment: {comment_id}")))?;

        self.comment_repo
            .set_status(&comment.id, decision.status())
            .await?;
        comment.status = decision.status();

        info!(comment_id = %comment.id, status = decision.verb(), "Comment moderated");
        Ok(comment)
    }

    /// Apply one decision to many comments. Unknown ids are skipped.
    pub async fn bulk_moderate(&self, ids: &[String], decision: Moderation) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::NothingSelected);
        }

        let count = self
            .comment_repo
            .set_status_many(ids, decision.status())
            .await?;

        info!(count, status = decision.verb(), "Comments moderated in bulk");
        Ok(count)
    }

    /// Delete a comment and its replies.
    pub async fn delete(&self, comment_id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        self.comment_repo.delete(comment_id).await?;

        info!(comment_id = %comment_id, post_id = %comment.post_id, "Comment deleted");
        Ok(comment)
    }

    /// Moderation listing with queue statistics, newest first.
    pub async fn admin_list(
        &self,
        filters: &CommentFilters,
        page: PageRequest,
    ) -> AppResult<(Paginated<ModerationItem>, CommentStats)> {
        let status = match non_blank(filters.status.as_deref()) {
            None | Some(ANY) => None,
            Some(raw) => Some(
                CommentStatus::parse(raw)
                    .ok_or_else(|| AppError::Validation(format!("Invalid status: {raw}")))?,
            ),
        };

        let query = CommentQuery {
            search: filters.search.clone(),
            status,
            post_id: non_blank(filters.post_id.as_deref())
                .filter(|p| *p != ANY)
                .map(ToString::to_string),
        };

        let filtered = self.comment_repo.count(&query).await?;
        let comments = self
            .comment_repo
            .list(&query, page.per_page, page.offset(filtered))
            .await?;

        let mut post_ids: Vec<String> = comments.iter().map(|c| c.post_id.clone()).collect();
        post_ids.sort();
        post_ids.dedup();
        let posts: HashMap<String, post::Model> = self
            .post_repo
            .find_by_ids(&post_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let items = self
            .with_authors(comments)
            .await?
            .into_iter()
            .map(|comment| {
                let post = posts.get(&comment.comment.post_id);
                ModerationItem {
                    post_title: post.map(|p| p.title.clone()).unwrap_or_default(),
                    post_slug: post.map(|p| p.slug.clone()).unwrap_or_default(),
                    comment,
                }
            })
            .collect();

        let stats = CommentStats {
            total: self.comment_repo.count_by_status(None).await?,
            pending: self
                .comment_repo
                .count_by_status(Some(CommentStatus::Pending))
                .await?,
            approved: self
                .comment_repo
                .count_by_status(Some(CommentStatus::Approved))
                .await?,
            rejected: self
                .comment_repo
                .count_by_status(Some(CommentStatus::Rejected))
                .await?,
            filtered,
        };

        Ok((page.paginate(items, filtered), stats))
    }
}
