//! Admin control plane: role gate, dashboard and user management.
//!
//! Content moderation goes through the regular post, comment and category
//! services once [`require_admin`] has passed.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::{post, post::PostStatus, user},
    repositories::{
        CategoryRepository, CommentRepository, PostRepository, UserFilter, UserRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::query::{PageRequest, Paginated};
use crate::services::user::{hash_password, verify_password};
use crate::text::{check_length, limits, non_blank};

/// Posts shown on a user's admin page.
const RECENT_POSTS: u64 = 5;

/// Whether the user may use the admin control plane.
#[must_use]
pub const fn is_admin(user: &user::Model) -> bool {
    user.is_admin()
}

/// Admit staff and superusers only.
///
/// No identity is `Unauthorized`, a non-admin identity is `Forbidden`.
pub fn require_admin(user: Option<&user::Model>) -> AppResult<&user::Model> {
    let user = user.ok_or(AppError::Unauthorized)?;
    if is_admin(user) {
        Ok(user)
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Admin service for business logic.
#[derive(Clone)]
pub struct AdminService {
    user_repo: UserRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    category_repo: CategoryRepository,
    id_gen: IdGenerator,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub active_users: u64,
    pub staff_users: u64,
    pub blocked_users: u64,
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_categories: u64,
    pub total_comments: u64,
}

/// A user with activity counts.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub user: user::Model,
    pub post_count: u64,
    pub comment_count: u64,
    pub recent_posts: Vec<post::Model>,
}

/// Input for creating a user from the admin panel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminCreateUserInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Nobody acts on their own account, and only superusers act on superusers.
fn check_target(actor: &user::Model, target: &user::Model, action: &str) -> AppResult<()> {
    if target.id == actor.id {
        return Err(AppError::Forbidden(format!(
            "You cannot {action} your own account."
        )));
    }
    if target.is_superuser && !actor.is_superuser {
        return Err(AppError::Forbidden(format!(
            "You cannot {action} a superuser."
        )));
    }
    Ok(())
}

fn check_user_lengths(
    username: Option<&str>,
    email: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> AppResult<()> {
    let fields = [
        ("Username", username, limits::USER_NAME),
        ("Email", email, limits::EMAIL),
        ("First name", first_name, limits::USER_NAME),
        ("Last name", last_name, limits::USER_NAME),
    ];
    for (label, value, max) in fields {
        if let Some(value) = value {
            check_length(label, value.trim(), max)?;
        }
    }
    Ok(())
}

/// Input for editing a user from the admin panel. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
    /// Replaces the password when non-empty.
    pub new_password: Option<String>,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        category_repo: CategoryRepository,
    ) -> Self {
        Self {
            user_repo,
            post_repo,
            comment_repo,
            category_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Sign in to the admin panel: valid credentials and an admin role.
    ///
    /// Every failure reports the same message so roles are not disclosed.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let denied =
            || AppError::Forbidden("Invalid credentials or insufficient permissions.".to_string());

        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active && is_admin(u))
            .ok_or_else(denied)?;

        if password.is_empty() || !verify_password(password, &user.password_hash)? {
            return Err(denied());
        }

        self.user_repo.touch_last_login(&user.id).await?;
        info!(user_id = %user.id, "Admin signed in");
        Ok(user)
    }

    /// Site-wide counters.
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        Ok(DashboardStats {
            total_users: self.user_repo.count_search(None, UserFilter::All).await?,
            active_users: self.user_repo.count_search(None, UserFilter::Active).await?,
            staff_users: self.user_repo.count_search(None, UserFilter::Staff).await?,
            blocked_users: self
                .user_repo
                .count_search(None, UserFilter::Inactive)
                .await?,
            total_posts: self.post_repo.count_by_status(None).await?,
            published_posts: self
                .post_repo
                .count_by_status(Some(PostStatus::Published))
                .await?,
            draft_posts: self
                .post_repo
                .count_by_status(Some(PostStatus::Draft))
                .await?,
            total_categories: self.category_repo.count().await?,
            total_comments: self.comment_repo.count_by_status(None).await?,
        })
    }

    /// Users newest first, searched over username, email and names.
    pub async fn list_users(
        &self,
        search: Option<&str>,
        filter: UserFilter,
        page: PageRequest,
    ) -> AppResult<Paginated<user::Model>> {
        let total = self.user_repo.count_search(search, filter).await?;
        let users = self
            .user_repo
            .search(search, filter, page.per_page, page.offset(total))
            .await?;
        Ok(page.paginate(users, total))
    }

    /// A user with their post and comment counts.
    pub async fn user_detail(&self, id: &str) -> AppResult<UserDetail> {
        let user = self.user_repo.get_by_id(id).await?;
        Ok(UserDetail {
            post_count: self.post_repo.count_by_author(id).await?,
            comment_count: self.comment_repo.count_by_author(id).await?,
            recent_posts: self.post_repo.recent_by_author(id, RECENT_POSTS).await?,
            user,
        })
    }

    /// Create a user with chosen flags.
    pub async fn create_user(&self, input: AdminCreateUserInput) -> AppResult<user::Model> {
        let username = input.username.trim();
        let email = input.email.trim();
        if username.is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(AppError::Validation(
                "Username, email, and password are required.".to_string(),
            ));
        }
        check_user_lengths(
            Some(username),
            Some(email),
            Some(&input.first_name),
            Some(&input.last_name),
        )?;

        if self.user_repo.username_exists(username, None).await? {
            return Err(AppError::Duplicate("Username already exists.".to_string()));
        }
        if self.user_repo.email_exists(email, None).await? {
            return Err(AppError::Duplicate("Email already exists.".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(&input.password)?),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            is_active: Set(input.is_active),
            is_staff: Set(input.is_staff),
            is_superuser: Set(false),
            date_joined: Set(chrono::Utc::now().into()),
            last_login: Set(None),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = %user.id, is_staff = user.is_staff, "User created by admin");
        Ok(user)
    }

    /// Edit a user's identity, flags or password.
    ///
    /// Clearing `is_active` is a block and is held to the same rules as
    /// [`AdminService::block_user`].
    pub async fn update_user(
        &self,
        actor: &user::Model,
        id: &str,
        input: AdminUpdateUserInput,
    ) -> AppResult<user::Model> {
        require_admin(Some(actor))?;
        let user = self.user_repo.get_by_id(id).await?;
        if user.is_active && input.is_active == Some(false) {
            check_target(actor, &user, "block")?;
        }

        let username = non_blank(input.username.as_deref());
        let email = non_blank(input.email.as_deref());
        check_user_lengths(
            username,
            email,
            input.first_name.as_deref(),
            input.last_name.as_deref(),
        )?;

        if let Some(username) = username {
            if self.user_repo.username_exists(username, Some(id)).await? {
                return Err(AppError::Duplicate("Username already exists.".to_string()));
            }
        }
        if let Some(email) = email {
            if self.user_repo.email_exists(email, Some(id)).await? {
                return Err(AppError::Duplicate("Email already exists.".to_string()));
            }
        }
        let password_hash = match non_blank(input.new_password.as_deref()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let mut active: user::ActiveModel = user.into();
        if let Some(username) = username {
            active.username = Set(username.to_string());
        }
        if let Some(email) = email {
            active.email = Set(email.to_string());
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(is_staff) = input.is_staff {
            active.is_staff = Set(is_staff);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.user_repo.update(active).await?;
        info!(user_id = %updated.id, actor_id = %actor.id, "User updated by admin");
        Ok(updated)
    }

    /// Load `target_id` and check `actor` may delete or block it.
    async fn guarded_target(
        &self,
        actor: &user::Model,
        target_id: &str,
        action: &str,
    ) -> AppResult<user::Model> {
        let target = self.user_repo.get_by_id(target_id).await?;
        check_target(actor, &target, action)?;
        Ok(target)
    }

    /// Delete a user along with their posts, comments and likes.
    pub async fn delete_user(
        &self,
        actor: &user::Model,
        target_id: &str,
    ) -> AppResult<user::Model> {
        require_admin(Some(actor))?;
        let target = self.guarded_target(actor, target_id, "delete").await?;

        self.user_repo.delete(&target.id).await?;
        info!(user_id = %target.id, actor_id = %actor.id, "User deleted");
        Ok(target)
    }

    /// Block a user from signing in.
    pub async fn block_user(&self, actor: &user::Model, target_id: &str) -> AppResult<user::Model> {
        require_admin(Some(actor))?;
        let mut target = self.guarded_target(actor, target_id, "block").await?;

        self.user_repo.set_active(&target.id, false).await?;
        target.is_active = false;
        info!(user_id = %target.id, actor_id = %actor.id, "User blocked");
        Ok(target)
    }

    /// Let a blocked user sign in again.
    pub async fn unblock_user(&self, target_id: &str) -> AppResult<user::Model> {
        let mut target = self.user_repo.get_by_id(target_id).await?;

        self.user_repo.set_active(&target.id, true).await?;
        target.is_active = true;
        info!(user_id = %target.id, "User unblocked");
        Ok(target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::user::tests::{count_row, create_test_user};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn mock() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn service(user_db: DatabaseConnection) -> AdminService {
        AdminService::new(
            UserRepository::new(Arc::new(user_db)),
            PostRepository::new(Arc::new(mock().into_connection())),
            CommentRepository::new(Arc::new(mock().into_connection())),
            CategoryRepository::new(Arc::new(mock().into_connection())),
        )
    }

    fn staff(id: &str) -> user::Model {
        let mut user = create_test_user(id, id);
        user.is_staff = true;
        user
    }

    fn superuser(id: &str) -> user::Model {
        let mut user = create_test_user(id, id);
        user.is_superuser = true;
        user
    }

    #[test]
    fn test_require_admin() {
        assert!(matches!(require_admin(None), Err(AppError::Unauthorized)));

        let plain = create_test_user("u1", "alice");
        assert!(matches!(
            require_admin(Some(&plain)),
            Err(AppError::Forbidden(_))
        ));

        let admin = staff("u2");
        assert_eq!(require_admin(Some(&admin)).unwrap().id, "u2");
        assert!(require_admin(Some(&superuser("u3"))).is_ok());
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let actor = staff("admin");
        let svc = service(mock().append_query_results([[actor.clone()]]).into_connection());

        let err = svc.delete_user(&actor, "admin").await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot delete your own account.");
    }

    #[tokio::test]
    async fn test_staff_cannot_block_superuser() {
        let actor = staff("admin");
        let svc = service(
            mock()
                .append_query_results([[superuser("root")]])
                .into_connection(),
        );

        let err = svc.block_user(&actor, "root").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.to_string(), "You cannot block a superuser.");
    }

    #[tokio::test]
    async fn test_cannot_block_self() {
        let actor = superuser("root");
        let svc = service(mock().append_query_results([[actor.clone()]]).into_connection());

        let err = svc.block_user(&actor, "root").await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot block your own account.");
    }

    #[tokio::test]
    async fn test_update_user_cannot_deactivate_self() {
        let actor = staff("admin");
        let svc = service(mock().append_query_results([[actor.clone()]]).into_connection());
        let input = AdminUpdateUserInput {
            is_active: Some(false),
            ..Default::default()
        };

        let err = svc.update_user(&actor, "admin", input).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot block your own account.");
    }

    #[tokio::test]
    async fn test_update_user_staff_cannot_deactivate_superuser() {
        let actor = staff("admin");
        let svc = service(
            mock()
                .append_query_results([[superuser("root")]])
                .into_connection(),
        );
        let input = AdminUpdateUserInput {
            is_active: Some(false),
            ..Default::default()
        };

        let err = svc.update_user(&actor, "root", input).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.to_string(), "You cannot block a superuser.");
    }

    #[tokio::test]
    async fn test_update_user_can_edit_self_while_active() {
        let actor = staff("admin");
        let mut renamed = actor.clone();
        renamed.first_name = "Ada".to_string();
        let svc = service(
            mock()
                .append_query_results([[actor.clone()]])
                .append_query_results([[renamed]])
                .into_connection(),
        );
        let input = AdminUpdateUserInput {
            first_name: Some("Ada".to_string()),
            is_active: Some(true),
            ..Default::default()
        };

        let updated = svc.update_user(&actor, "admin", input).await.unwrap();
        assert_eq!(updated.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_update_user_rejects_long_email() {
        let actor = superuser("root");
        let svc = service(mock().append_query_results([[staff("u1")]]).into_connection());
        let input = AdminUpdateUserInput {
            email: Some(format!("{}@example.com", "a".repeat(250))),
            ..Default::default()
        };

        let err = svc.update_user(&actor, "u1", input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Email")));
    }

    #[tokio::test]
    async fn test_superuser_can_block_superuser() {
        let actor = superuser("root");
        let svc = service(
            mock()
                .append_query_results([[superuser("root2")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let target = svc.block_user(&actor, "root2").await.unwrap();
        assert!(!target.is_active);
    }

    #[tokio::test]
    async fn test_non_admin_actor_rejected() {
        let actor = create_test_user("u1", "alice");
        let svc = service(mock().into_connection());

        let err = svc.delete_user(&actor, "u2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_user_requires_fields() {
        let svc = service(mock().into_connection());

        let err = svc
            .create_user(AdminCreateUserInput {
                username: "bob".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username, email, and password are required."
        );
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let svc = service(
            mock()
                .append_query_results([[count_row(0)]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let err = svc
            .create_user(AdminCreateUserInput {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password: "secret".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already exists.");
    }

    #[tokio::test]
    async fn test_login_rejects_non_admin() {
        let svc = service(
            mock()
                .append_query_results([[create_test_user("u1", "alice")]])
                .into_connection(),
        );

        let err = svc.login("alice", "correct horse").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid credentials or insufficient permissions."
        );
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let counts = |n| mock().append_query_results([[count_row(n)]]);
        let svc = AdminService::new(
            UserRepository::new(Arc::new(
                mock()
                    .append_query_results([[count_row(10)]])
                    .append_query_results([[count_row(8)]])
                    .append_query_results([[count_row(2)]])
                    .append_query_results([[count_row(2)]])
                    .into_connection(),
            )),
            PostRepository::new(Arc::new(
                mock()
                    .append_query_results([[count_row(5)]])
                    .append_query_results([[count_row(3)]])
                    .append_query_results([[count_row(2)]])
                    .into_connection(),
            )),
            CommentRepository::new(Arc::new(counts(7).into_connection())),
            CategoryRepository::new(Arc::new(counts(4).into_connection())),
        );

        let stats = svc.dashboard().await.unwrap();
        assert_eq!(stats.total_users, 10);
        assert_eq!(stats.blocked_users, 2);
        assert_eq!(stats.published_posts, 3);
        assert_eq!(stats.draft_posts, 2);
        assert_eq!(stats.total_categories, 4);
        assert_eq!(stats.total_comments, 7);
    }
}
