//! Post like repository.

use std::sync::Arc;

use crate::entities::{Post, PostLike, post, post_like};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// Whether the user likes the post after the toggle.
    pub liked: bool,
    /// The post's like counter after the toggle.
    pub like_count: i32,
}

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether the user currently likes the post.
    pub async fn exists(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let count = PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Count likes recorded for a post.
    pub async fn count_for_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the user's like on a post.
    ///
    /// The like row and the post's `like_count` change in one transaction.
    /// Insertion relies on the `(user_id, post_id)` unique index, so two
    /// concurrent toggles can never leave duplicate rows behind.
    pub async fn toggle(
        &self,
        like_id: String,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<LikeToggle> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let like = post_like::ActiveModel {
            id: Set(like_id),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let inserted = PostLike::insert(like)
            .on_conflict(
                OnConflict::columns([post_like::Column::UserId, post_like::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let liked = inserted > 0;

        if liked {
            Post::update_many()
                .col_expr(
                    post::Column::LikeCount,
                    Expr::col(post::Column::LikeCount).add(1),
                )
                .filter(post::Column::Id.eq(post_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        } else {
            let removed = PostLike::delete_many()
                .filter(post_like::Column::UserId.eq(user_id))
                .filter(post_like::Column::PostId.eq(post_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if removed.rows_affected > 0 {
                Post::update_many()
                    .col_expr(
                        post::Column::LikeCount,
                        Expr::cust("GREATEST(like_count - 1, 0)"),
                    )
                    .filter(post::Column::Id.eq(post_id))
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        let post = Post::find_by_id(post_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Post: {post_id}")))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(LikeToggle {
            liked,
            like_count: post.like_count,
        })
    }
}
