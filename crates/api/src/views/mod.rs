//! Page path.
//!
//! Handlers build a typed context and hand it to the configured
//! [`PageRenderer`] together with a template name. Form posts answer with
//! `303 See Other` and carry their flash message in the `flash` query
//! parameter of the target.

mod accounts;
mod admin;
mod blog;

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    middleware::map_response_with_state,
    response::{IntoResponse, Redirect, Response},
};
use quill_common::AppError;
use quill_db::entities::user;
use serde::Serialize;
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Turns a template name and its context into a response.
pub trait PageRenderer: Send + Sync {
    /// Render `template` with `context`.
    fn render(&self, template: &str, context: Value) -> Response;
}

/// Renderer emitting `{"template": ..., "context": ...}`.
///
/// Stands in for a template engine; front ends render the context
/// themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl PageRenderer for JsonRenderer {
    fn render(&self, template: &str, context: Value) -> Response {
        Json(json!({ "template": template, "context": context })).into_response()
    }
}

/// Fields every page context carries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageBase {
    /// Username of the signed-in user.
    pub current_user: Option<String>,
    pub is_admin: bool,
    pub flash: Option<String>,
}

impl PageBase {
    fn new(user: Option<&user::Model>, flash: Flash) -> Self {
        Self {
            current_user: user.map(|u| u.username.clone()),
            is_admin: user.is_some_and(user::Model::is_admin),
            flash: flash.0,
        }
    }
}

/// Flash message carried by the `flash` query parameter.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Option<String>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.uri.query().and_then(read_flash)))
    }
}

fn read_flash(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.strip_prefix("flash="))
        .find_map(|raw| {
            urlencoding::decode(&raw.replace('+', " "))
                .ok()
                .map(|s| s.into_owned())
        })
        .filter(|s| !s.is_empty())
}

/// `303 See Other` to `path` with a flash message.
#[must_use]
pub fn flash_redirect(path: &str, message: &str) -> Response {
    let sep = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{sep}flash={}",
        urlencoding::encode(message)
    ))
    .into_response()
}

/// Error shown as an error page instead of a redirect.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Marker left on error responses for [`render_error_pages`].
#[derive(Debug, Clone)]
struct ErrorPage {
    message: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "Server error occurred");
        }

        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage {
            message: self.0.client_message(),
        });
        response
    }
}

/// Page handler result.
pub type PageResult = Result<Response, PageError>;

/// Answer a form post: success goes where the handler says, client errors
/// go back to `back` with their message.
///
/// Missing records and server errors still become error pages.
pub fn settle(result: Result<Response, AppError>, back: &str) -> PageResult {
    match result {
        Ok(response) => Ok(response),
        Err(e @ AppError::NotFound(_)) => Err(PageError(e)),
        Err(e) if e.is_server_error() => Err(PageError(e)),
        Err(e) => Ok(flash_redirect(back, &e.client_message())),
    }
}

/// Render a context through the configured renderer.
pub fn render<C: Serialize>(state: &AppState, template: &str, context: &C) -> PageResult {
    let context = serde_json::to_value(context)
        .map_err(|e| PageError(AppError::Internal(e.to_string())))?;
    Ok(state.renderer.render(template, context))
}

/// Only same-site absolute paths are followed after login.
///
/// Browsers read `\` as `/`, so any backslash or control character is refused
/// along with protocol-relative and scheme-bearing targets.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://")
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

async fn render_error_pages(State(state): State<AppState>, response: Response) -> Response {
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let status = response.status();
    let mut rendered = state.renderer.render(
        "error.html",
        json!({ "status": status.as_u16(), "message": page.message }),
    );
    *rendered.status_mut() = status;
    rendered
}

/// Create the page router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(blog::router())
        .nest("/accounts", accounts::router())
        .nest("/admin", admin::router())
        .fallback(not_found)
        .layer(map_response_with_state(state, render_error_pages))
}

/// Not found page for unknown paths.
pub async fn not_found() -> PageError {
    PageError(AppError::NotFound("Page".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_flash() {
        assert_eq!(
            read_flash("page=2&flash=Comment%20approved."),
            Some("Comment approved.".to_string())
        );
        assert_eq!(read_flash("flash=a+b"), Some("a b".to_string()));
        assert_eq!(read_flash("flash="), None);
        assert_eq!(read_flash("page=1"), None);
    }

    #[test]
    fn test_flash_redirect_appends_parameter() {
        let response = flash_redirect("/admin/comments?page=2", "Done.");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/admin/comments?page=2&flash=Done."
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/post/hello")), "/post/hello");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/\\/evil.example")), "/");
        assert_eq!(safe_next(Some("/\tevil.example")), "/");
        assert_eq!(safe_next(Some("/redirect?to=https://evil.example")), "/");
        assert_eq!(safe_next(Some("evil.example")), "/");
        assert_eq!(safe_next(Some("/search?q=rust")), "/search?q=rust");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_settle_flashes_client_errors() {
        let response = settle(Err(AppError::Validation("Bad.".to_string())), "/back").unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/back?flash=Bad.");

        assert!(settle(Err(AppError::NotFound("x".to_string())), "/back").is_err());
        assert!(settle(Err(AppError::Database("x".to_string())), "/back").is_err());
    }

    #[test]
    fn test_page_error_keeps_status() {
        let response = PageError(AppError::NotFound("Post: x".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorPage>().is_some());
    }
}
