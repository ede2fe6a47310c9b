//! Admin panel pages.

use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, Form as MultiForm};
use quill_common::AppError;
use quill_core::{
    AdminCreateUserInput, AdminUpdateUserInput, CategoryInput, CategoryWithCount, CommentStats,
    CommentFilters, CommentView, DashboardStats, Moderation, ModerationItem, PageRequest,
    Paginated, PostSummary, UserDetail,
};
use quill_db::{
    entities::{category, post, post_attachment, user},
    repositories::UserFilter,
};
use serde::{Deserialize, Serialize};

use super::{Flash, PageBase, PageResult, flash_redirect, render, settle};
use crate::{
    extractors::{CurrentSession, MaybeAuthUser, PageAdmin},
    middleware::AppState,
    multipart::PostForm,
};

/// Posts offered in the comment listing's post filter.
const POST_FILTER_CHOICES: u64 = 50;

// ==================== Forms and queries ====================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    pub filter: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub post: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
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
    pub is_staff: Option<String>,
    /// Checked unless the form says otherwise.
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditUserForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<String>,
    pub is_staff: Option<String>,
    pub new_password: Option<String>,
}

/// Where to go after a user action: `detail` returns to the user's page.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnForm {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkForm {
    #[serde(default)]
    pub comment_ids: Vec<String>,
}

fn checked(value: Option<&str>) -> bool {
    value == Some("on")
}

// ==================== Contexts ====================

#[derive(Serialize)]
pub struct DashboardContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub stats: DashboardStats,
}

#[derive(Serialize)]
pub struct UserListContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub page: Paginated<user::Model>,
    pub search_query: String,
    pub filter_type: &'static str,
    pub total_users: u64,
}

#[derive(Serialize)]
pub struct UserDetailContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub user_obj: UserDetail,
}

#[derive(Serialize)]
pub struct PostListContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub page: Paginated<PostSummary>,
    pub search_query: String,
    pub status_filter: String,
    pub category_filter: String,
    pub categories: Vec<category::Model>,
    pub total_blogs: u64,
}

#[derive(Serialize)]
pub struct PostFormContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub post: Option<post::Model>,
    pub attachments: Vec<post_attachment::Model>,
    pub categories: Vec<category::Model>,
}

#[derive(Serialize)]
pub struct PostDetailContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub post: post::Model,
    pub attachments: Vec<post_attachment::Model>,
    pub comments: Vec<CommentView>,
}

#[derive(Serialize)]
pub struct CommentListContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub page: Paginated<ModerationItem>,
    pub stats: CommentStats,
    pub search_query: String,
    pub status_filter: String,
    pub post_filter: String,
    pub blog_posts: Vec<post::Model>,
}

#[derive(Serialize)]
pub struct CategoryListContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub categories: Vec<CategoryWithCount>,
    pub search_query: String,
}

#[derive(Serialize)]
pub struct CategoryFormContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub category: Option<category::Model>,
}

fn admin_page(state: &AppState, page: Option<&str>) -> PageRequest {
    PageRequest::parse(page, state.config.blog.admin_page_size)
}

fn or_all(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| quill_core::services::post::ANY.to_string())
}

// ==================== Session ====================

async fn login_page(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    flash: Flash,
) -> PageResult {
    if user.as_ref().is_some_and(user::Model::is_admin) {
        return Ok(Redirect::to("/admin").into_response());
    }
    render(&state, "admin/login.html", &PageBase::new(None, flash))
}

async fn login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    Form(form): Form<AdminLoginForm>,
) -> PageResult {
    let user = match state
        .admin_service
        .login(form.username.trim(), &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => return settle(Err(e), "/admin/login"),
    };

    let session = state.session_service.login(&session, &user.id).await?;
    Ok((
        jar.add(state.session_cookie(&session)),
        flash_redirect("/admin", "Welcome to Admin Panel!"),
    )
        .into_response())
}

async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> PageResult {
    state.session_service.logout(&session).await?;
    Ok((
        state.forget(jar),
        flash_redirect("/admin/login", "You have been logged out successfully."),
    )
        .into_response())
}

async fn dashboard(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
) -> PageResult {
    let stats = state.admin_service.dashboard().await?;
    render(
        &state,
        "admin/dashboard.html",
        &DashboardContext {
            base: PageBase::new(Some(&admin), flash),
            stats,
        },
    )
}

// ==================== Users ====================

async fn user_list(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let filter = UserFilter::parse(query.filter.as_deref());
    let page = state
        .admin_service
        .list_users(
            query.search.as_deref(),
            filter,
            admin_page(&state, query.page.as_deref()),
        )
        .await?;

    render(
        &state,
        "admin/user_management.html",
        &UserListContext {
            base: PageBase::new(Some(&admin), flash),
            total_users: page.total,
            page,
            search_query: query.search.unwrap_or_default(),
            filter_type: filter.as_str(),
        },
    )
}

async fn create_user_page(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
) -> PageResult {
    render(
        &state,
        "admin/create_user.html",
        &PageBase::new(Some(&admin), flash),
    )
}

async fn create_user(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Form(form): Form<CreateUserForm>,
) -> PageResult {
    let input = AdminCreateUserInput {
        username: form.username,
        email: form.email,
        password: form.password,
        first_name: form.first_name,
        last_name: form.last_name,
        is_staff: checked(form.is_staff.as_deref()),
        is_active: checked(Some(form.is_active.as_deref().unwrap_or("on"))),
    };

    let result = state.admin_service.create_user(input).await.map(|user| {
        flash_redirect(
            &format!("/admin/users/{}", user.id),
            &format!("User {} created successfully!", user.username),
        )
    });
    settle(result, "/admin/users/create")
}

async fn user_detail(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Path(id): Path<String>,
) -> PageResult {
    let detail = state.admin_service.user_detail(&id).await?;
    render(
        &state,
        "admin/user_detail.html",
        &UserDetailContext {
            base: PageBase::new(Some(&admin), flash),
            user_obj: detail,
        },
    )
}

async fn update_user(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    Path(id): Path<String>,
    Form(form): Form<EditUserForm>,
) -> PageResult {
    let input = AdminUpdateUserInput {
        username: form.username,
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
        is_staff: Some(checked(form.is_staff.as_deref())),
        is_active: Some(checked(form.is_active.as_deref())),
        new_password: form.new_password,
    };

    let back = format!("/admin/users/{id}");
    let result = state
        .admin_service
        .update_user(&admin, &id, input)
        .await
        .map(|user| {
            flash_redirect(
                &back,
                &format!("User {} updated successfully!", user.username),
            )
        });
    settle(result, &back)
}

fn user_return_path(id: &str, form: &ReturnForm) -> String {
    if form.next.as_deref() == Some("detail") {
        format!("/admin/users/{id}")
    } else {
        "/admin/users".to_string()
    }
}

async fn delete_user(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    Path(id): Path<String>,
) -> PageResult {
    let result = state
        .admin_service
        .delete_user(&admin, &id)
        .await
        .map(|user| {
            flash_redirect(
                "/admin/users",
                &format!("User {} has been deleted successfully.", user.username),
            )
        });
    settle(result, "/admin/users")
}

async fn block_user(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    Path(id): Path<String>,
    Form(form): Form<ReturnForm>,
) -> PageResult {
    let back = user_return_path(&id, &form);
    let result = state
        .admin_service
        .block_user(&admin, &id)
        .await
        .map(|user| {
            flash_redirect(
                &back,
                &format!(
                    "User {} has been blocked successfully. They will not be able to login.",
                    user.username
                ),
            )
        });
    settle(result, "/admin/users")
}

async fn unblock_user(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path(id): Path<String>,
    Form(form): Form<ReturnForm>,
) -> PageResult {
    let back = user_return_path(&id, &form);
    let result = state.admin_service.unblock_user(&id).await.map(|user| {
        flash_redirect(
            &back,
            &format!(
                "User {} has been unblocked successfully. They can now login.",
                user.username
            ),
        )
    });
    settle(result, "/admin/users")
}

// ==================== Posts ====================

async fn post_list(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let status_filter = or_all(query.status);
    let category_filter = or_all(query.category);

    let page = state
        .post_service
        .admin_list(
            query.search.as_deref(),
            Some(status_filter.as_str()),
            Some(category_filter.as_str()),
            admin_page(&state, query.page.as_deref()),
        )
        .await;
    let page = match page {
        Ok(page) => page,
        Err(e @ AppError::Validation(_)) => {
            return Ok(flash_redirect("/admin/blogs", &e.client_message()));
        }
        Err(e) => return Err(e.into()),
    };
    let categories = state.category_service.list().await?;

    render(
        &state,
        "admin/blog_management.html",
        &PostListContext {
            base: PageBase::new(Some(&admin), flash),
            total_blogs: page.total,
            page,
            search_query: query.search.unwrap_or_default(),
            status_filter,
            category_filter,
            categories,
        },
    )
}

async fn create_post_page(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
) -> PageResult {
    let categories = state.category_service.list().await?;
    render(
        &state,
        "admin/create_blog.html",
        &PostFormContext {
            base: PageBase::new(Some(&admin), flash),
            post: None,
            attachments: vec![],
            categories,
        },
    )
}

async fn create_post(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    multipart: Multipart,
) -> PageResult {
    let form = PostForm::parse(multipart).await?;
    let result = state
        .post_service
        .create(&admin.id, form.into_create())
        .await
        .map(|post| {
            flash_redirect(
                &format!("/admin/blogs/{}", post.id),
                &format!("Blog post \"{}\" created successfully!", post.title),
            )
        });
    settle(result, "/admin/blogs/create")
}

async fn post_detail(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Path(id): Path<String>,
) -> PageResult {
    let post = state.post_service.get(&id).await?;
    let attachments = state.post_service.attachments(&id).await?;
    let comments = state.comment_service.all_for_post(&id).await?;

    render(
        &state,
        "admin/blog_detail.html",
        &PostDetailContext {
            base: PageBase::new(Some(&admin), flash),
            post,
            attachments,
            comments,
        },
    )
}

async fn edit_post_page(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Path(id): Path<String>,
) -> PageResult {
    let post = state.post_service.get(&id).await?;
    let attachments = state.post_service.attachments(&id).await?;
    let categories = state.category_service.list().await?;

    render(
        &state,
        "admin/edit_blog.html",
        &PostFormContext {
            base: PageBase::new(Some(&admin), flash),
            post: Some(post),
            attachments,
            categories,
        },
    )
}

async fn edit_post(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> PageResult {
    let mut input = PostForm::parse(multipart).await?.into_update();
    // An unchecked checkbox is simply missing from the form
    input.is_featured.get_or_insert(false);

    let result = state.post_service.update(&id, input).await.map(|post| {
        flash_redirect(
            &format!("/admin/blogs/{}", post.id),
            &format!("Blog post \"{}\" updated successfully!", post.title),
        )
    });
    settle(result, &format!("/admin/blogs/{id}/edit"))
}

async fn delete_post(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path(id): Path<String>,
) -> PageResult {
    let post = state.post_service.delete(&id).await?;
    Ok(flash_redirect(
        "/admin/blogs",
        &format!("Blog post \"{}\" has been deleted successfully.", post.title),
    ))
}

async fn delete_attachment(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path((id, attachment_id)): Path<(String, String)>,
) -> PageResult {
    state
        .post_service
        .delete_attachment(&id, &attachment_id)
        .await?;
    Ok(flash_redirect(
        &format!("/admin/blogs/{id}/edit"),
        "Attachment deleted successfully.",
    ))
}

async fn moderate_post_comment(
    state: &AppState,
    post_id: &str,
    comment_id: &str,
    decision: Moderation,
) -> PageResult {
    state
        .comment_service
        .moderate(Some(post_id), comment_id, decision)
        .await?;
    let message = match decision {
        Moderation::Approve => "Comment approved.",
        Moderation::Reject => "Comment rejected.",
    };
    Ok(flash_redirect(&format!("/admin/blogs/{post_id}"), message))
}

async fn approve_post_comment(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path((id, comment_id)): Path<(String, String)>,
) -> PageResult {
    moderate_post_comment(&state, &id, &comment_id, Moderation::Approve).await
}

async fn reject_post_comment(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path((id, comment_id)): Path<(String, String)>,
) -> PageResult {
    moderate_post_comment(&state, &id, &comment_id, Moderation::Reject).await
}

// ==================== Comments ====================

async fn comment_list(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let status_filter = or_all(query.status);
    let post_filter = or_all(query.post);
    let filters = CommentFilters {
        search: query.search.clone(),
        status: Some(status_filter.clone()),
        post_id: Some(post_filter.clone()),
    };

    let result = state
        .comment_service
        .admin_list(&filters, admin_page(&state, query.page.as_deref()))
        .await;
    let (page, stats) = match result {
        Ok(listing) => listing,
        Err(e @ AppError::Validation(_)) => {
            return Ok(flash_redirect("/admin/comments", &e.client_message()));
        }
        Err(e) => return Err(e.into()),
    };
    let blog_posts = state.post_service.recent(POST_FILTER_CHOICES).await?;

    render(
        &state,
        "admin/comment_management.html",
        &CommentListContext {
            base: PageBase::new(Some(&admin), flash),
            page,
            stats,
            search_query: query.search.unwrap_or_default(),
            status_filter,
            post_filter,
            blog_posts,
        },
    )
}

async fn bulk_moderate(state: &AppState, form: BulkForm, decision: Moderation) -> PageResult {
    let result = state
        .comment_service
        .bulk_moderate(&form.comment_ids, decision)
        .await
        .map(|count| {
            flash_redirect(
                "/admin/comments",
                &format!("{count} comments {} successfully.", decision.verb()),
            )
        });
    settle(result, "/admin/comments")
}

async fn bulk_approve(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    MultiForm(form): MultiForm<BulkForm>,
) -> PageResult {
    bulk_moderate(&state, form, Moderation::Approve).await
}

async fn bulk_reject(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    MultiForm(form): MultiForm<BulkForm>,
) -> PageResult {
    bulk_moderate(&state, form, Moderation::Reject).await
}

async fn delete_comment(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path(id): Path<String>,
    Form(form): Form<ReturnForm>,
) -> PageResult {
    let comment = state.comment_service.delete(&id).await?;
    let back = if form.next.as_deref() == Some("post") {
        format!("/admin/blogs/{}", comment.post_id)
    } else {
        "/admin/comments".to_string()
    };
    Ok(flash_redirect(&back, "Comment has been deleted."))
}

// ==================== Categories ====================

async fn category_list(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let categories = state
        .category_service
        .admin_list(query.search.as_deref())
        .await?;

    render(
        &state,
        "admin/category_management.html",
        &CategoryListContext {
            base: PageBase::new(Some(&admin), flash),
            categories,
            search_query: query.search.unwrap_or_default(),
        },
    )
}

async fn create_category_page(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
) -> PageResult {
    render(
        &state,
        "admin/create_category.html",
        &CategoryFormContext {
            base: PageBase::new(Some(&admin), flash),
            category: None,
        },
    )
}

async fn create_category(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Form(input): Form<CategoryInput>,
) -> PageResult {
    let result = state.category_service.create(input).await.map(|category| {
        flash_redirect(
            "/admin/categories",
            &format!("Category \"{}\" created successfully!", category.name),
        )
    });
    settle(result, "/admin/categories/create")
}

async fn edit_category_page(
    State(state): State<AppState>,
    PageAdmin(admin): PageAdmin,
    flash: Flash,
    Path(id): Path<String>,
) -> PageResult {
    let category = state.category_service.get(&id).await?;
    render(
        &state,
        "admin/edit_category.html",
        &CategoryFormContext {
            base: PageBase::new(Some(&admin), flash),
            category: Some(category),
        },
    )
}

async fn edit_category(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path(id): Path<String>,
    Form(input): Form<CategoryInput>,
) -> PageResult {
    let result = state.category_service.update(&id, input).await.map(|category| {
        flash_redirect(
            "/admin/categories",
            &format!("Category \"{}\" updated successfully!", category.name),
        )
    });
    settle(result, &format!("/admin/categories/{id}/edit"))
}

async fn delete_category(
    State(state): State<AppState>,
    PageAdmin(_admin): PageAdmin,
    Path(id): Path<String>,
) -> PageResult {
    let result = state.category_service.delete(&id).await.map(|category| {
        flash_redirect(
            "/admin/categories",
            &format!("Category \"{}\" has been deleted successfully.", category.name),
        )
    });
    settle(result, "/admin/categories")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
        // Users
        .route("/users", get(user_list))
        .route("/users/create", get(create_user_page).post(create_user))
        .route("/users/{id}", get(user_detail).post(update_user))
        .route("/users/{id}/delete", post(delete_user))
        .route("/users/{id}/block", post(block_user))
        .route("/users/{id}/unblock", post(unblock_user))
        // Posts
        .route("/blogs", get(post_list))
        .route("/blogs/create", get(create_post_page).post(create_post))
        .route("/blogs/{id}", get(post_detail))
        .route("/blogs/{id}/edit", get(edit_post_page).post(edit_post))
        .route("/blogs/{id}/delete", post(delete_post))
        .route(
            "/blogs/{id}/attachments/delete/{attachment_id}",
            post(delete_attachment),
        )
        .route(
            "/blogs/{id}/comments/{comment_id}/approve",
            post(approve_post_comment),
        )
        .route(
            "/blogs/{id}/comments/{comment_id}/reject",
            post(reject_post_comment),
        )
        // Comments
        .route("/comments", get(comment_list))
        .route("/comments/bulk-approve", post(bulk_approve))
        .route("/comments/bulk-reject", post(bulk_reject))
        .route("/comments/{id}/delete", post(delete_comment))
        // Categories
        .route("/categories", get(category_list))
        .route(
            "/categories/create",
            get(create_category_page).post(create_category),
        )
        .route(
            "/categories/{id}/edit",
            get(edit_category_page).post(edit_category),
        )
        .route("/categories/{id}/delete", post(delete_category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked() {
        assert!(checked(Some("on")));
        assert!(!checked(Some("off")));
        assert!(!checked(None));
    }

    #[test]
    fn test_or_all() {
        assert_eq!(or_all(None), "all");
        assert_eq!(or_all(Some(String::new())), "all");
        assert_eq!(or_all(Some("draft".to_string())), "draft");
    }

    #[test]
    fn test_user_return_path() {
        let detail = ReturnForm {
            next: Some("detail".to_string()),
        };
        assert_eq!(user_return_path("u1", &detail), "/admin/users/u1");
        assert_eq!(user_return_path("u1", &ReturnForm::default()), "/admin/users");
    }
}
