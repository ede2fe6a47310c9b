//! HTTP layer for quill.
//!
//! This crate exposes the blog over two projections of the same service
//! calls:
//!
//! - **Endpoints**: JSON API under `/api`
//! - **Views**: page contexts handed to a [`views::PageRenderer`], with
//!   form posts answered by `303 See Other` redirects
//! - **Extractors**: session, authenticated user and admin gate
//! - **Middleware**: session resolution from cookie or bearer token
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod multipart;
pub mod response;
pub mod views;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;
pub use views::{JsonRenderer, PageRenderer};

/// Full application router: pages, JSON API and session resolution.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(views::router(state.clone()))
        .nest("/api", endpoints::router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .with_state(state)
}
