//! Request extractors.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::Redirect,
};
use quill_common::{AppError, Session};
use quill_core::require_admin;
use quill_db::entities::user;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by session middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Staff or superuser. 401 without a user, 403 for other users.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<user::Model>();
        require_admin(user).cloned().map(AdminUser)
    }
}

/// The request's session.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| AppError::Internal("Session middleware not installed".to_string()))
    }
}

/// Signed-in user on the page path; others are sent to the login page.
#[derive(Debug, Clone)]
pub struct PageUser(pub user::Model);

impl<S> FromRequestParts<S> for PageUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(PageUser)
            .ok_or_else(|| {
                // Nested routers see a stripped path
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map_or(&parts.uri, |original| &original.0);
                let next = uri.path_and_query().map_or("/", |pq| pq.as_str());
                Redirect::to(&format!(
                    "/accounts/login?next={}",
                    urlencoding::encode(next)
                ))
            })
    }
}

/// Admin on the page path; others are sent to the admin login page.
#[derive(Debug, Clone)]
pub struct PageAdmin(pub user::Model);

impl<S> FromRequestParts<S> for PageAdmin
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_admin(parts.extensions.get::<user::Model>())
            .cloned()
            .map(PageAdmin)
            .map_err(|_| Redirect::to("/admin/login"))
    }
}
