//! Post repository.

use std::sync::Arc;

use crate::entities::{
    Category, Post, User, category, post, post::PostStatus, post_attachment, user,
};
use crate::repositories::attachment::insert_all;
use crate::repositories::search::{contains_pattern, icontains};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, Query},
};

/// Which fields a post search term is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostSearchScope {
    /// Title, content or excerpt (public listing).
    #[default]
    TitleContentExcerpt,
    /// Title or content (JSON listing).
    TitleContent,
    /// Title, content or author username (admin listing).
    TitleContentAuthor,
}

/// Filters for a post listing. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub search: Option<String>,
    pub scope: PostSearchScope,
    pub status: Option<PostStatus>,
    pub category_id: Option<String>,
    pub category_slug: Option<String>,
    pub featured_only: bool,
}

impl PostQuery {
    /// Published posts only.
    #[must_use]
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Default::default()
        }
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(pattern) = self.search.as_deref().and_then(contains_pattern) {
            let mut any = Condition::any()
                .add(icontains(post::Column::Title, &pattern))
                .add(icontains(post::Column::Content, &pattern));

            match self.scope {
                PostSearchScope::TitleContentExcerpt => {
                    any = any.add(icontains(post::Column::Excerpt, &pattern));
                }
                PostSearchScope::TitleContent => {}
                PostSearchScope::TitleContentAuthor => {
                    any = any.add(
                        post::Column::AuthorId.in_subquery(
                            Query::select()
                                .column(user::Column::Id)
                                .from(User)
                                .and_where(icontains(user::Column::Username, &pattern))
                                .to_owned(),
                        ),
                    );
                }
            }

            condition = condition.add(any);
        }

        if let Some(status) = self.status {
            condition = condition.add(post::Column::Status.eq(status));
        }

        if let Some(category_id) = &self.category_id {
            condition = condition.add(post::Column::CategoryId.eq(category_id.clone()));
        }

        if let Some(slug) = &self.category_slug {
            condition = condition.add(
                post::Column::CategoryId.in_subquery(
                    Query::select()
                        .column(category::Column::Id)
                        .from(Category)
                        .and_where(category::Column::Slug.eq(slug.clone()))
                        .to_owned(),
                ),
            );
        }

        if self.featured_only {
            condition = condition.add(post::Column::IsFeatured.eq(true));
        }

        condition
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post: {id}")))
    }

    /// Find posts by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Post::find()
            .filter(post::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by slug, whatever its status.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a published post by slug.
    pub async fn find_published_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Status.eq(PostStatus::Published))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a post other than `except_id` already uses this slug.
    pub async fn slug_exists(&self, slug: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = Post::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = except_id {
            query = query.filter(post::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Insert a post and its attachment rows in one transaction.
    pub async fn create(
        &self,
        model: post::ActiveModel,
        attachments: Vec<post_attachment::ActiveModel>,
    ) -> AppResult<(post::Model, Vec<post_attachment::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let post = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let attachments = insert_all(&txn, attachments).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok((post, attachments))
    }

    /// Update a post and add attachment rows in one transaction.
    pub async fn update(
        &self,
        model: post::ActiveModel,
        attachments: Vec<post_attachment::ActiveModel>,
    ) -> AppResult<(post::Model, Vec<post_attachment::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let post = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let attachments = insert_all(&txn, attachments).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok((post, attachments))
    }

    /// Delete a post. Attachments, comments and likes cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically add one to the view counter.
    pub async fn increment_view_count(&self, id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List posts matching `query`, newest first.
    pub async fn list(
        &self,
        query: &PostQuery,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(query.condition())
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts matching `query`.
    pub async fn count(&self, query: &PostQuery) -> AppResult<u64> {
        Post::find()
            .filter(query.condition())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Featured published posts, newest first.
    pub async fn featured(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        let query = PostQuery {
            featured_only: true,
            ..PostQuery::published()
        };
        self.list(&query, limit, 0).await
    }

    /// Other published posts of the same category, newest first.
    pub async fn related(
        &self,
        category_id: &str,
        exclude_id: &str,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Status.eq(PostStatus::Published))
            .filter(post::Column::CategoryId.eq(category_id))
            .filter(post::Column::Id.ne(exclude_id))
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts filed under a category, any status.
    pub async fn count_by_category(&self, category_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts with the given status, or all posts.
    pub async fn count_by_status(&self, status: Option<PostStatus>) -> AppResult<u64> {
        let mut query = Post::find();
        if let Some(status) = status {
            query = query.filter(post::Column::Status.eq(status));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts written by a user.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent posts of a user.
    pub async fn recent_by_author(
        &self,
        author_id: &str,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
