//! JSON API endpoints.

mod accounts;
mod admin;
mod blog;

use axum::{Json, Router, extract::rejection::JsonRejection};
use quill_common::{AppError, AppResult};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/accounts", accounts::router())
        .nest("/blog", blog::router())
        .nest("/admin", admin::router())
}

/// Unwrap a JSON body, reporting any parse failure as a bad request.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|_| AppError::BadRequest("Invalid JSON".to_string()))
}
