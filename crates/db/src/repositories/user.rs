//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use crate::repositories::search::{contains_pattern, icontains};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Role/state filter of the admin user listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserFilter {
    #[default]
    All,
    Active,
    Inactive,
    Staff,
}

impl UserFilter {
    /// Parse a query value; unknown values mean [`UserFilter::All`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("active") => Self::Active,
            Some("inactive") => Self::Inactive,
            Some("staff") => Self::Staff,
            _ => Self::All,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Staff => "staff",
        }
    }
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User: {id}")))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the username is taken, optionally ignoring one user.
    pub async fn username_exists(
        &self,
        username: &str,
        except_id: Option<&str>,
    ) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Username.eq(username));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Whether the email is taken, optionally ignoring one user.
    pub async fn email_exists(&self, email: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user. Posts, comments and likes go with it (FK cascade).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the active flag (block/unblock).
    pub async fn set_active(&self, id: &str, is_active: bool) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::IsActive, Expr::value(is_active))
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Stamp `last_login` after a successful sign-in.
    pub async fn touch_last_login(&self, id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(
                user::Column::LastLogin,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    fn search_condition(search: Option<&str>, filter: UserFilter) -> Condition {
        let mut condition = Condition::all();

        if let Some(pattern) = search.and_then(contains_pattern) {
            condition = condition.add(
                Condition::any()
                    .add(icontains(user::Column::Username, &pattern))
                    .add(icontains(user::Column::Email, &pattern))
                    .add(icontains(user::Column::FirstName, &pattern))
                    .add(icontains(user::Column::LastName, &pattern)),
            );
        }

        match filter {
            UserFilter::All => {}
            UserFilter::Active => condition = condition.add(user::Column::IsActive.eq(true)),
            UserFilter::Inactive => condition = condition.add(user::Column::IsActive.eq(false)),
            UserFilter::Staff => condition = condition.add(user::Column::IsStaff.eq(true)),
        }

        condition
    }

    /// Search users for the admin listing, newest first.
    pub async fn search(
        &self,
        search: Option<&str>,
        filter: UserFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(Self::search_condition(search, filter))
            .order_by_desc(user::Column::DateJoined)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users matching the admin listing filters.
    pub async fn count_search(&self, search: Option<&str>, filter: UserFilter) -> AppResult<u64> {
        User::find()
            .filter(Self::search_condition(search, filter))
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

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now().into(),
            last_login: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_user_filter_parse() {
        assert_eq!(UserFilter::parse(Some("active")), UserFilter::Active);
        assert_eq!(UserFilter::parse(Some("inactive")), UserFilter::Inactive);
        assert_eq!(UserFilter::parse(Some("staff")), UserFilter::Staff);
        assert_eq!(UserFilter::parse(Some("bogus")), UserFilter::All);
        assert_eq!(UserFilter::parse(None), UserFilter::All);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let user = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("u1").await.unwrap();

        assert_eq!(result.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = UserRepository::new(db);

        let result = repo.find_by_ids(&[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.set_active("u1", false).await.is_ok());
    }
}
