//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, Post, User, comment, comment::CommentStatus, post, user};
use crate::repositories::search::{contains_pattern, icontains};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Query},
};

/// Filters for the moderation listing.
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    /// Matched against content, author username and post title.
    pub search: Option<String>,
    pub status: Option<CommentStatus>,
    pub post_id: Option<String>,
}

impl CommentQuery {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(pattern) = self.search.as_deref().and_then(contains_pattern) {
            condition = condition.add(
                Condition::any()
                    .add(icontains(comment::Column::Content, &pattern))
                    .add(
                        comment::Column::AuthorId.in_subquery(
                            Query::select()
                                .column(user::Column::Id)
                                .from(User)
                                .and_where(icontains(user::Column::Username, &pattern))
                                .to_owned(),
                        ),
                    )
                    .add(
                        comment::Column::PostId.in_subquery(
                            Query::select()
                                .column(post::Column::Id)
                                .from(Post)
                                .and_where(icontains(post::Column::Title, &pattern))
                                .to_owned(),
                        ),
                    ),
            );
        }

        if let Some(status) = self.status {
            condition = condition.add(comment::Column::Status.eq(status));
        }

        if let Some(post_id) = &self.post_id {
            condition = condition.add(comment::Column::PostId.eq(post_id.clone()));
        }

        condition
    }
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment: {id}")))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment. Its replies cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the status of one comment.
    pub async fn set_status(&self, id: &str, status: CommentStatus) -> AppResult<u64> {
        self.set_status_many(&[id.to_string()], status).await
    }

    /// Set the status of many comments. Returns how many rows changed.
    ///
    /// Ids that do not exist are ignored.
    pub async fn set_status_many(&self, ids: &[String], status: CommentStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Comment::update_many()
            .col_expr(comment::Column::Status, Expr::value(status.as_str()))
            .col_expr(
                comment::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(comment::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Every comment on a post, newest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved top-level comments of a post, oldest first.
    pub async fn approved_top_level(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::ParentId.is_null())
            .filter(comment::Column::Status.eq(CommentStatus::Approved))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved replies to any of `parent_ids`, oldest first.
    pub async fn approved_replies(&self, parent_ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::ParentId.is_in(parent_ids.to_vec()))
            .filter(comment::Column::Status.eq(CommentStatus::Approved))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Moderation listing, newest first.
    pub async fn list(
        &self,
        query: &CommentQuery,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(query.condition())
            .order_by_desc(comment::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments matching `query`.
    pub async fn count(&self, query: &CommentQuery) -> AppResult<u64> {
        Comment::find()
            .filter(query.condition())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments with the given status, or all comments.
    pub async fn count_by_status(&self, status: Option<CommentStatus>) -> AppResult<u64> {
        self.count(&CommentQuery {
            status,
            ..Default::default()
        })
        .await
    }

    /// Count comments written by a user.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_comment(id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            author_id: "u1".to_string(),
            parent_id: parent_id.map(ToString::to_string),
            content: "Nice post".to_string(),
            status: CommentStatus::Approved,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_approved_top_level() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("c1", None)]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.approved_top_level("p1").await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].parent_id.is_none());
    }

    #[tokio::test]
    async fn test_approved_replies_empty_parents() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = CommentRepository::new(db);

        assert!(repo.approved_replies(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_many_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let ids = vec!["c1".to_string(), "c2".to_string(), "missing".to_string()];
        let updated = repo
            .set_status_many(&ids, CommentStatus::Approved)
            .await
            .unwrap();

        assert_eq!(updated, 2);
    }

    #[tokio::test]
    async fn test_set_status_many_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = CommentRepository::new(db);

        assert_eq!(
            repo.set_status_many(&[], CommentStatus::Rejected)
                .await
                .unwrap(),
            0
        );
    }
}
