//! Public blog endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use quill_common::{AppError, AppResult};
use quill_core::{PageRequest, PostFilters};
use quill_db::repositories::PostSearchScope;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::{
    extractors::{AuthUser, CurrentSession},
    middleware::AppState,
    response::{
        CategoryResponse, CommentResponse, PostDetailResponse, PostListItem, PostListResponse,
        like_message,
    },
};

/// Listing query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Category list response.
#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryResponse>,
}

/// Comment submission.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<String>,
}

/// Comment submission response.
#[derive(Serialize)]
pub struct AddCommentResponse {
    pub success: bool,
    pub message: String,
    pub comment: CommentResponse,
}

/// Like toggle response.
#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i32,
    pub message: String,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> AppResult<Json<PostListResponse>> {
    let blog = &state.config.blog;
    let page = PageRequest::parse_sized(
        query.page.as_deref(),
        query.per_page.as_deref(),
        blog.api_default_per_page,
        blog.api_max_per_page,
    );
    let filters = PostFilters {
        search: query.search,
        category_slug: query.category,
    };

    let listing = state
        .post_service
        .list_published(&filters, PostSearchScope::TitleContent, page)
        .await?;

    Ok(Json(PostListResponse {
        total_pages: listing.total_pages,
        current_page: listing.current_page,
        has_next: listing.has_next,
        has_previous: listing.has_previous,
        posts: listing.items.into_iter().map(PostListItem::from).collect(),
    }))
}

async fn post_detail(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> AppResult<(CookieJar, Json<PostDetailResponse>)> {
    let mut post = state.post_service.get_published_by_slug(&slug).await?;

    let jar = if state
        .post_service
        .record_view(&post.id, &mut session.data)
        .await?
    {
        post.view_count += 1;
        state.session_service.save(&session).await?;
        state.remember(jar, &session)
    } else {
        jar
    };

    let comments = state.comment_service.approved_thread(&post.id).await?;
    let summary = state
        .post_service
        .summarize(vec![post])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Post: {slug}")))?;

    Ok((jar, Json(PostDetailResponse::new(summary, comments))))
}

async fn list_categories(State(state): State<AppState>) -> AppResult<Json<CategoriesResponse>> {
    let categories = state.category_service.list_with_counts().await?;

    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(Into::into).collect(),
    }))
}

async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(slug): Path<String>,
    body: Result<Json<AddCommentRequest>, JsonRejection>,
) -> AppResult<Json<AddCommentResponse>> {
    let post = state.post_service.get_published_by_slug(&slug).await?;
    let req = json_body(body)?;

    let comment = state
        .comment_service
        .add(&post, &user, &req.content, req.parent_id.as_deref())
        .await?;

    Ok(Json(AddCommentResponse {
        success: true,
        message: "Comment submitted successfully".to_string(),
        comment: comment.into(),
    }))
}

async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<LikeResponse>> {
    let post = state.post_service.get_published_by_slug(&slug).await?;
    let toggle = state.like_service.toggle(&user.id, &post.id).await?;

    Ok(Json(LikeResponse {
        liked: toggle.liked,
        like_count: toggle.like_count,
        message: like_message(toggle.liked).to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{slug}", get(post_detail))
        .route("/posts/{slug}/comment", post(add_comment))
        .route("/posts/{slug}/like", post(toggle_like))
        .route("/categories", get(list_categories))
}
