//! Admin endpoints.
//!
//! Every handler goes through the [`AdminUser`] gate first.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, rejection::JsonRejection},
    routing::{delete, get, post, put},
};
use axum_extra::extract::CookieJar;
use quill_common::AppResult;
use quill_core::{
    AdminCreateUserInput, AdminUpdateUserInput, CategoryInput, CategoryWithCount, CommentFilters,
    CommentStats, CommentView, DashboardStats, ModerationItem, Moderation, PageRequest, Paginated,
    PostSummary, UserDetail,
};
use quill_db::{
    entities::{category, comment, post, post_attachment, user},
    repositories::UserFilter,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::{
    extractors::{AdminUser, CurrentSession},
    middleware::AppState,
    multipart::PostForm,
    response::{MessageResponse, UserResponse},
};

// ==================== Request/Response Types ====================

/// Admin login request.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Admin login response.
#[derive(Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

/// Listing query string shared by the admin listings.
#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    pub filter: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub post: Option<String>,
}

/// Post with attachments and every comment.
#[derive(Serialize)]
pub struct AdminPostDetail {
    pub post: post::Model,
    pub attachments: Vec<post_attachment::Model>,
    pub comments: Vec<CommentView>,
}

/// Comment moderation listing.
#[derive(Serialize)]
pub struct CommentListResponse {
    pub comments: Paginated<ModerationItem>,
    pub stats: CommentStats,
}

/// Bulk moderation request.
#[derive(Debug, Deserialize)]
pub struct BulkModerationRequest {
    #[serde(default)]
    pub comment_ids: Vec<String>,
}

/// Bulk moderation response.
#[derive(Serialize)]
pub struct BulkModerationResponse {
    pub success: bool,
    pub message: String,
    pub count: u64,
}

/// Category listing.
#[derive(Serialize)]
pub struct AdminCategoriesResponse {
    pub categories: Vec<CategoryWithCount>,
}

fn admin_page(state: &AppState, page: Option<&str>) -> PageRequest {
    PageRequest::parse(page, state.config.blog.admin_page_size)
}

// ==================== Session ====================

async fn login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    body: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AdminLoginResponse>)> {
    let req = json_body(body)?;
    let user = state
        .admin_service
        .login(req.username.trim(), &req.password)
        .await?;
    let session = state.session_service.login(&session, &user.id).await?;

    Ok((
        jar.add(state.session_cookie(&session)),
        Json(AdminLoginResponse {
            success: true,
            message: "Welcome to Admin Panel!".to_string(),
            user: user.into(),
        }),
    ))
}

async fn dashboard(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.admin_service.dashboard().await?))
}

// ==================== Users ====================

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<Paginated<user::Model>>> {
    let users = state
        .admin_service
        .list_users(
            query.search.as_deref(),
            UserFilter::parse(query.filter.as_deref()),
            admin_page(&state, query.page.as_deref()),
        )
        .await?;
    Ok(Json(users))
}

async fn create_user(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    body: Result<Json<AdminCreateUserInput>, JsonRejection>,
) -> AppResult<Json<user::Model>> {
    let user = state.admin_service.create_user(json_body(body)?).await?;
    Ok(Json(user))
}

async fn user_detail(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserDetail>> {
    Ok(Json(state.admin_service.user_detail(&id).await?))
}

async fn update_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AdminUpdateUserInput>, JsonRejection>,
) -> AppResult<Json<user::Model>> {
    let user = state
        .admin_service
        .update_user(&admin, &id, json_body(body)?)
        .await?;
    Ok(Json(user))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let user = state.admin_service.delete_user(&admin, &id).await?;
    Ok(Json(MessageResponse::ok(format!(
        "User {} has been deleted successfully.",
        user.username
    ))))
}

async fn block_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let user = state.admin_service.block_user(&admin, &id).await?;
    Ok(Json(MessageResponse::ok(format!(
        "User {} has been blocked successfully. They will not be able to login.",
        user.username
    ))))
}

async fn unblock_user(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let user = state.admin_service.unblock_user(&id).await?;
    Ok(Json(MessageResponse::ok(format!(
        "User {} has been unblocked successfully. They can now login.",
        user.username
    ))))
}

// ==================== Posts ====================

async fn list_posts(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<Paginated<PostSummary>>> {
    let posts = state
        .post_service
        .admin_list(
            query.search.as_deref(),
            query.status.as_deref(),
            query.category.as_deref(),
            admin_page(&state, query.page.as_deref()),
        )
        .await?;
    Ok(Json(posts))
}

async fn create_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<post::Model>> {
    let form = PostForm::parse(multipart).await?;
    let post = state
        .post_service
        .create(&admin.id, form.into_create())
        .await?;
    Ok(Json(post))
}

async fn post_detail(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AdminPostDetail>> {
    let post = state.post_service.get(&id).await?;
    let attachments = state.post_service.attachments(&id).await?;
    let comments = state.comment_service.all_for_post(&id).await?;

    Ok(Json(AdminPostDetail {
        post,
        attachments,
        comments,
    }))
}

async fn update_post(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<post::Model>> {
    let form = PostForm::parse(multipart).await?;
    let post = state
        .post_service
        .update(&id, form.into_update())
        .await?;
    Ok(Json(post))
}

async fn delete_post(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let post = state.post_service.delete(&id).await?;
    Ok(Json(MessageResponse::ok(format!(
        "Blog post \"{}\" has been deleted successfully.",
        post.title
    ))))
}

async fn add_attachments(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<Vec<post_attachment::Model>>> {
    let form = PostForm::parse(multipart).await?;
    let attachments = state
        .post_service
        .add_attachments(&id, form.into_attachments())
        .await?;
    Ok(Json(attachments))
}

async fn delete_attachment(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path((id, attachment_id)): Path<(String, String)>,
) -> AppResult<Json<MessageResponse>> {
    state
        .post_service
        .delete_attachment(&id, &attachment_id)
        .await?;
    Ok(Json(MessageResponse::ok("Attachment deleted successfully.")))
}

async fn moderate_post_comment(
    state: &AppState,
    post_id: &str,
    comment_id: &str,
    decision: Moderation,
) -> AppResult<Json<comment::Model>> {
    let comment = state
        .comment_service
        .moderate(Some(post_id), comment_id, decision)
        .await?;
    Ok(Json(comment))
}

async fn approve_post_comment(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<comment::Model>> {
    moderate_post_comment(&state, &id, &comment_id, Moderation::Approve).await
}

async fn reject_post_comment(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<comment::Model>> {
    moderate_post_comment(&state, &id, &comment_id, Moderation::Reject).await
}

// ==================== Comments ====================

async fn list_comments(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<CommentListResponse>> {
    let page = admin_page(&state, query.page.as_deref());
    let filters = CommentFilters {
        search: query.search,
        status: query.status,
        post_id: query.post,
    };

    let (comments, stats) = state.comment_service.admin_list(&filters, page).await?;
    Ok(Json(CommentListResponse { comments, stats }))
}

async fn bulk_moderate(
    state: &AppState,
    req: BulkModerationRequest,
    decision: Moderation,
) -> AppResult<Json<BulkModerationResponse>> {
    let count = state
        .comment_service
        .bulk_moderate(&req.comment_ids, decision)
        .await?;

    Ok(Json(BulkModerationResponse {
        success: true,
        message: format!("{count} comments {} successfully.", decision.verb()),
        count,
    }))
}

async fn bulk_approve(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    body: Result<Json<BulkModerationRequest>, JsonRejection>,
) -> AppResult<Json<BulkModerationResponse>> {
    bulk_moderate(&state, json_body(body)?, Moderation::Approve).await
}

async fn bulk_reject(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    body: Result<Json<BulkModerationRequest>, JsonRejection>,
) -> AppResult<Json<BulkModerationResponse>> {
    bulk_moderate(&state, json_body(body)?, Moderation::Reject).await
}

async fn delete_comment(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.comment_service.delete(&id).await?;
    Ok(Json(MessageResponse::ok("Comment has been deleted.")))
}

// ==================== Categories ====================

async fn list_categories(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<AdminCategoriesResponse>> {
    let categories = state
        .category_service
        .admin_list(query.search.as_deref())
        .await?;
    Ok(Json(AdminCategoriesResponse { categories }))
}

async fn create_category(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> AppResult<Json<category::Model>> {
    let category = state.category_service.create(json_body(body)?).await?;
    Ok(Json(category))
}

async fn update_category(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> AppResult<Json<category::Model>> {
    let category = state
        .category_service
        .update(&id, json_body(body)?)
        .await?;
    Ok(Json(category))
}

async fn delete_category(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let category = state.category_service.delete(&id).await?;
    Ok(Json(MessageResponse::ok(format!(
        "Category \"{}\" has been deleted successfully.",
        category.name
    ))))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/dashboard", get(dashboard))
        // Users
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(user_detail).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/block", post(block_user))
        .route("/users/{id}/unblock", post(unblock_user))
        // Posts
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(post_detail).put(update_post).delete(delete_post),
        )
        .route("/posts/{id}/attachments", post(add_attachments))
        .route(
            "/posts/{id}/attachments/{attachment_id}",
            delete(delete_attachment),
        )
        .route(
            "/posts/{id}/comments/{comment_id}/approve",
            post(approve_post_comment),
        )
        .route(
            "/posts/{id}/comments/{comment_id}/reject",
            post(reject_post_comment),
        )
        // Comments
        .route("/comments", get(list_comments))
        .route("/comments/bulk-approve", post(bulk_approve))
        .route("/comments/bulk-reject", post(bulk_reject))
        .route("/comments/{id}", delete(delete_comment))
        // Categories
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
}
