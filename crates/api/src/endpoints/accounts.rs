//! Account endpoints: login, registration, logout and profile.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use quill_common::AppResult;
use quill_core::{RegisterInput, UpdateProfileInput};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::json_body;
use crate::{
    extractors::{AuthUser, CurrentSession, MaybeAuthUser},
    middleware::AppState,
    response::{MessageResponse, ProfileResponse, UserResponse},
};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login or registration response.
#[derive(Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

/// Profile update request.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AccountResponse>)> {
    let req = json_body(body)?;
    let user = state
        .user_service
        .authenticate(req.username.trim(), &req.password)
        .await?;

    let session = state.session_service.login(&session, &user.id).await?;

    Ok((
        jar.add(state.session_cookie(&session)),
        Json(AccountResponse {
            success: true,
            message: "Login successful".to_string(),
            user: user.into(),
        }),
    ))
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> AppResult<Json<AccountResponse>> {
    let user = state.user_service.register(json_body(body)?).await?;

    Ok(Json(AccountResponse {
        success: true,
        message: "Registration successful".to_string(),
        user: user.into(),
    }))
}

async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> AppResult<Response> {
    if user.is_none() {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "User not authenticated", "code": "UNAUTHORIZED" })),
        )
            .into_response());
    }

    state.session_service.logout(&session).await?;
    Ok((
        state.forget(jar),
        Json(MessageResponse::ok("Logout successful")),
    )
        .into_response())
}

async fn profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(user.into())
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Json<ProfileResponse>> {
    let req = json_body(body)?;
    let updated = state
        .user_service
        .update_profile(
            &user,
            UpdateProfileInput {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/profile", get(profile).put(update_profile))
}
