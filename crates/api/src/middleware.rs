//! Application state and session middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use quill_common::{Config, Session, config::SessionConfig};
use quill_core::{
    AdminService, CategoryService, CommentService, LikeService, PostService, SessionService,
    UserService,
};
use tracing::warn;

use crate::views::PageRenderer;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub session_service: SessionService,
    pub category_service: CategoryService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub admin_service: AdminService,
    pub renderer: Arc<dyn PageRenderer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Cookie carrying `session`'s token.
    #[must_use]
    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        build_cookie(&self.config.session, session.token.clone())
    }

    /// Add the session cookie when the client does not hold the token yet.
    #[must_use]
    pub fn remember(&self, jar: CookieJar, session: &Session) -> CookieJar {
        if session.is_new {
            jar.add(self.session_cookie(session))
        } else {
            jar
        }
    }

    /// Drop the session cookie.
    #[must_use]
    pub fn forget(&self, jar: CookieJar) -> CookieJar {
        jar.remove(build_cookie(&self.config.session, String::new()))
    }
}

fn build_cookie(config: &SessionConfig, value: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .build()
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

/// Session middleware.
///
/// Resolves the session from the `Authorization: Bearer` header or the
/// session cookie and stores it in the request extensions, together with
/// the signed-in user when that user still exists and is active.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(&req).or_else(|| {
        jar.get(&state.config.session.cookie_name)
            .map(|c| c.value().to_string())
    });

    let session = match state.session_service.open(token.as_deref()).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    if let Some(user_id) = &session.data.user_id {
        match state.user_service.find_active(user_id).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load session user"),
        }
    }

    req.extensions_mut().insert(session);
    next.run(req).await
}
