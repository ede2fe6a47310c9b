//! Account pages.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::CookieJar;
use quill_common::AppError;
use quill_core::{RegisterInput, UpdateProfileInput};
use serde::{Deserialize, Serialize};

use super::{Flash, PageBase, PageResult, flash_redirect, render, safe_next, settle};
use crate::{
    extractors::{CurrentSession, MaybeAuthUser, PageUser},
    middleware::AppState,
    response::ProfileResponse,
};

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct LoginContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileContext {
    #[serde(flatten)]
    pub base: PageBase,
    pub profile: ProfileResponse,
}

async fn login_page(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    flash: Flash,
    Query(query): Query<NextQuery>,
) -> PageResult {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    render(
        &state,
        "accounts/login.html",
        &LoginContext {
            base: PageBase::new(None, flash),
            next: query.next,
        },
    )
}

async fn login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> PageResult {
    let next = safe_next(form.next.as_deref()).to_string();

    let user = match state
        .user_service
        .authenticate(form.username.trim(), &form.password)
        .await
    {
        Ok(user) => user,
        Err(AppError::InvalidCredentials) => {
            return Ok(flash_redirect(
                &login_path(&next),
                "Invalid username or password.",
            ));
        }
        Err(e) => return settle(Err(e), &login_path(&next)),
    };

    let session = state.session_service.login(&session, &user.id).await?;
    Ok((
        jar.add(state.session_cookie(&session)),
        flash_redirect(&next, "Login successful!"),
    )
        .into_response())
}

fn login_path(next: &str) -> String {
    if next == "/" {
        "/accounts/login".to_string()
    } else {
        format!("/accounts/login?next={}", urlencoding::encode(next))
    }
}

async fn register_page(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    flash: Flash,
) -> PageResult {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render(&state, "accounts/register.html", &PageBase::new(None, flash))
}

async fn register(
    State(state): State<AppState>,
    Form(mut input): Form<RegisterInput>,
) -> PageResult {
    // The form always carries a confirmation, even an empty one
    input.password_confirm.get_or_insert_with(String::new);

    let result = state
        .user_service
        .register(input)
        .await
        .map(|_| flash_redirect("/accounts/login", "Registration successful! Please login."));
    settle(result, "/accounts/register")
}

async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> PageResult {
    state.session_service.logout(&session).await?;
    Ok((
        state.forget(jar),
        flash_redirect("/", "You have been logged out successfully."),
    )
        .into_response())
}

async fn profile_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    flash: Flash,
) -> PageResult {
    render(
        &state,
        "accounts/profile.html",
        &ProfileContext {
            base: PageBase::new(Some(&user), flash),
            profile: user.into(),
        },
    )
}

async fn update_profile(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Form(form): Form<ProfileForm>,
) -> PageResult {
    let input = UpdateProfileInput {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
    };

    let result = state
        .user_service
        .update_profile(&user, input)
        .await
        .map(|_| flash_redirect("/accounts/profile", "Profile updated successfully!"));
    settle(result, "/accounts/profile")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout).post(logout))
        .route("/profile", get(profile_page).post(update_profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_path_keeps_next() {
        assert_eq!(login_path("/"), "/accounts/login");
        assert_eq!(
            login_path("/post/hello"),
            "/accounts/login?next=%2Fpost%2Fhello"
        );
    }
}
