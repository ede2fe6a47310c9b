//! Category repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Category, Post, category, post, post::PostStatus};
use crate::repositories::search::{contains_pattern, icontains};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<category::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category: {id}")))
    }

    /// Find categories by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by its slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a category other than `except_id` already uses this exact name.
    pub async fn name_exists(&self, name: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = Category::find().filter(category::Column::Name.eq(name));
        if let Some(id) = except_id {
            query = query.filter(category::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Whether a category other than `except_id` already uses this slug.
    pub async fn slug_exists(&self, slug: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = Category::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = except_id {
            query = query.filter(category::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// All categories ordered by name.
    pub async fn list_all(&self) -> AppResult<Vec<category::Model>> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Categories whose name or description contains `search`, ordered by name.
    pub async fn search(&self, search: Option<&str>) -> AppResult<Vec<category::Model>> {
        let mut query = Category::find();

        if let Some(pattern) = search.and_then(contains_pattern) {
            query = query.filter(
                Condition::any()
                    .add(icontains(category::Column::Name, &pattern))
                    .add(icontains(category::Column::Description, &pattern)),
            );
        }

        query
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new category.
    pub async fn create(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a category.
    pub async fn update(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a category.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all categories.
    pub async fn count(&self) -> AppResult<u64> {
        Category::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Post counts per category id, in one grouped query.
    ///
    /// With `published_only` drafts are left out of the counts.
    /// Categories without posts are absent from the map.
    pub async fn post_counts(&self, published_only: bool) -> AppResult<HashMap<String, u64>> {
        let mut query = Post::find()
            .select_only()
            .column(post::Column::CategoryId)
            .column_as(Expr::col(post::Column::Id).count(), "count")
            .filter(post::Column::CategoryId.is_not_null());

        if published_only {
            query = query.filter(post::Column::Status.eq(PostStatus::Published));
        }

        let rows: Vec<(Option<String>, i64)> = query
            .group_by(post::Column::CategoryId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, count)| id.map(|id| (id, u64::try_from(count).unwrap_or(0))))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_category(id: &str, name: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let cat = create_test_category("c1", "Rust");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[cat.clone()]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.find_by_slug("rust").await.unwrap();

        assert_eq!(result.unwrap().id, "c1");
    }

    #[tokio::test]
    async fn test_list_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_category("c1", "Go"),
                    create_test_category("c2", "Rust"),
                ]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.list_all().await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].name, "Rust");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
