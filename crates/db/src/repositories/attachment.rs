//! Post attachment repository.

use std::sync::Arc;

use crate::entities::{PostAttachment, post_attachment};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

/// Insert attachment rows on `conn`, which is normally an open transaction.
pub(crate) async fn insert_all<C: ConnectionTrait>(
    conn: &C,
    models: Vec<post_attachment::ActiveModel>,
) -> AppResult<Vec<post_attachment::Model>> {
    let mut inserted = Vec::with_capacity(models.len());
    for model in models {
        inserted.push(
            model
                .insert(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        );
    }
    Ok(inserted)
}

/// Attachment repository for database operations.
#[derive(Clone)]
pub struct AttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Attachments of a post in upload order.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<post_attachment::Model>> {
        PostAttachment::find()
            .filter(post_attachment::Column::PostId.eq(post_id))
            .order_by_asc(post_attachment::Column::UploadedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// An attachment, only if it belongs to `post_id`.
    pub async fn find_for_post(
        &self,
        post_id: &str,
        id: &str,
    ) -> AppResult<Option<post_attachment::Model>> {
        PostAttachment::find_by_id(id)
            .filter(post_attachment::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create attachment rows, all or none.
    pub async fn create_many(
        &self,
        models: Vec<post_attachment::ActiveModel>,
    ) -> AppResult<Vec<post_attachment::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let inserted = insert_all(&txn, models).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted)
    }

    /// Delete an attachment row.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        PostAttachment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, IntoActiveModel, MockDatabase};

    fn create_test_attachment(id: &str, post_id: &str) -> post_attachment::Model {
        post_attachment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            file_key: format!("blog_attachments/{id}.pdf"),
            url: format!("/media/blog_attachments/{id}.pdf"),
            title: "Slides".to_string(),
            description: String::new(),
            content_type: "application/pdf".to_string(),
            size: 1024,
            uploaded_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_attachment("a1", "p1"),
                    create_test_attachment("a2", "p1"),
                ]])
                .into_connection(),
        );

        let repo = AttachmentRepository::new(db);
        let result = repo.find_by_post("p1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_for_post_mismatch() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post_attachment::Model>::new()])
                .into_connection(),
        );

        let repo = AttachmentRepository::new(db);
        let result = repo.find_for_post("other", "a1").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_many_commits_once() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_attachment("a1", "p1")]])
                .append_query_results([[create_test_attachment("a2", "p1")]])
                .into_connection(),
        );

        let repo = AttachmentRepository::new(db.clone());
        let created = repo
            .create_many(vec![
                create_test_attachment("a1", "p1")
                    .into_active_model()
                    .reset_all(),
                create_test_attachment("a2", "p1")
                    .into_active_model()
                    .reset_all(),
            ])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        assert!(format!("{log:?}").contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_create_many_fails_as_a_whole() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_attachment("a1", "p1")]])
                .append_query_errors([DbErr::Custom("value too long".to_string())])
                .into_connection(),
        );

        let repo = AttachmentRepository::new(db);
        let result = repo
            .create_many(vec![
                create_test_attachment("a1", "p1")
                    .into_active_model()
                    .reset_all(),
                create_test_attachment("a2", "p1")
                    .into_active_model()
                    .reset_all(),
            ])
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
