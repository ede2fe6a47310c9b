//! Public blog pages.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use quill_common::AppError;
use quill_core::{PageRequest, Paginated, PostFilters, PostSummary, ThreadComment};
use quill_db::{entities::category, repositories::PostSearchScope};
use serde::{Deserialize, Serialize};

use super::{Flash, PageBase, PageResult, flash_redirect, render, settle};
use crate::{
    extractors::{CurrentSession, MaybeAuthUser, PageUser},
    middleware::AppState,
    response::like_message,
};

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Serialize)]
pub struct PostListContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub page: Paginated<PostSummary>,
    pub featured_posts: Vec<PostSummary>,
    pub categories: Vec<category::Model>,
    pub search_query: Option<String>,
    pub selected_category: Option<String>,
}

#[derive(Serialize)]
pub struct PostDetailContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub post: PostSummary,
    pub comments: Vec<ThreadComment>,
    pub is_liked: bool,
    pub related_posts: Vec<PostSummary>,
}

#[derive(Serialize)]
pub struct CategoryPostsContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub category: category::Model,
    pub page: Paginated<PostSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<String>,
}

fn post_path(slug: &str) -> String {
    format!("/post/{slug}")
}

async fn post_list(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    flash: Flash,
    Query(query): Query<PostListQuery>,
) -> PageResult {
    let page = PageRequest::parse(query.page.as_deref(), state.config.blog.public_page_size);
    let filters = PostFilters {
        search: query.search.clone(),
        category_slug: query.category.clone(),
    };

    let listing = state
        .post_service
        .list_published(&filters, PostSearchScope::TitleContentExcerpt, page)
        .await?;
    let featured_posts = state.post_service.featured(&filters).await?;
    let categories = state.category_service.list().await?;

    render(
        &state,
        "blog/post_list.html",
        &PostListContext {
            base: PageBase::new(user.as_ref(), flash),
            page: listing,
            featured_posts,
            categories,
            search_query: query.search,
            selected_category: query.category,
        },
    )
}

async fn post_detail(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    CurrentSession(mut session): CurrentSession,
    jar: CookieJar,
    flash: Flash,
    Path(slug): Path<String>,
) -> PageResult {
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
    let is_liked = match &user {
        Some(user) => state.like_service.is_liked(&user.id, &post.id).await?,
        None => false,
    };
    let related_posts = state.post_service.related(&post).await?;
    let post = state
        .post_service
        .summarize(vec![post])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Post: {slug}")))?;

    let page = render(
        &state,
        "blog/post_detail.html",
        &PostDetailContext {
            base: PageBase::new(user.as_ref(), flash),
            post,
            comments,
            is_liked,
            related_posts,
        },
    )?;
    Ok((jar, page).into_response())
}

async fn add_comment(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(slug): Path<String>,
    Form(form): Form<CommentForm>,
) -> PageResult {
    let post = state.post_service.get_published_by_slug(&slug).await?;
    let back = post_path(&slug);

    let result = state
        .comment_service
        .add(&post, &user, &form.content, form.parent_id.as_deref())
        .await
        .map(|_| {
            flash_redirect(
                &back,
                "Your comment has been submitted and is awaiting approval.",
            )
        });
    settle(result, &back)
}

async fn toggle_like(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> PageResult {
    let post = state.post_service.get_published_by_slug(&slug).await?;
    let toggle = state.like_service.toggle(&user.id, &post.id).await?;
    let message = like_message(toggle.liked);

    let is_xhr = headers
        .get("x-requested-with")
        .is_some_and(|v| v.as_bytes() == b"XMLHttpRequest");
    if is_xhr {
        return Ok(Json(serde_json::json!({
            "liked": toggle.liked,
            "like_count": toggle.like_count,
            "message": message,
        }))
        .into_response());
    }

    Ok(flash_redirect(&post_path(&slug), message))
}

async fn category_posts(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    flash: Flash,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let category = state.category_service.get_by_slug(&slug).await?;
    let page = PageRequest::parse(query.page.as_deref(), state.config.blog.public_page_size);
    let listing = state
        .post_service
        .list_by_category(&category.id, page)
        .await?;

    render(
        &state,
        "blog/category_posts.html",
        &CategoryPostsContext {
            base: PageBase::new(user.as_ref(), flash),
            category,
            page: listing,
        },
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(post_list))
        .route("/post/{slug}", get(post_detail))
        .route("/post/{slug}/comment", post(add_comment))
        .route("/post/{slug}/like", post(toggle_like))
        .route("/category/{slug}", get(category_posts))
}
