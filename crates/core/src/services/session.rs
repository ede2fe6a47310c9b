//! Session lifecycle on top of a [`SessionStore`].

use std::sync::Arc;

use quill_common::{AppResult, IdGenerator, Session, SessionData, SessionStore};
use tracing::debug;

/// Session service.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    id_gen: IdGenerator,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            id_gen: IdGenerator::new(),
        }
    }

    fn fresh(&self, data: SessionData) -> Session {
        Session {
            token: self.id_gen.generate_token(),
            data,
            is_new: true,
        }
    }

    /// Resume the session for `token`, or start an unsaved anonymous one.
    pub async fn open(&self, token: Option<&str>) -> AppResult<Session> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Some(data) = self.store.load(token).await? {
                return Ok(Session {
                    token: token.to_string(),
                    data,
                    is_new: false,
                });
            }
            debug!("Unknown or expired session token");
        }

        Ok(self.fresh(SessionData::default()))
    }

    /// Persist the session's data.
    pub async fn save(&self, session: &Session) -> AppResult<()> {
        self.store.save(&session.token, &session.data).await
    }

    /// Bind the session to a user under a new token.
    ///
    /// The previous token is discarded; posts already viewed carry over.
    pub async fn login(&self, session: &Session, user_id: &str) -> AppResult<Session> {
        if !session.is_new {
            self.store.delete(&session.token).await?;
        }

        let data = SessionData {
            user_id: Some(user_id.to_string()),
            viewed_posts: session.data.viewed_posts.clone(),
        };
        let next = self.fresh(data);
        self.save(&next).await?;

        Ok(next)
    }

    /// Drop the session entirely.
    pub async fn logout(&self, session: &Session) -> AppResult<Session> {
        if !session.is_new {
            self.store.delete(&session.token).await?;
        }
        Ok(self.fresh(SessionData::default()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quill_common::MemorySessionStore;
    use std::time::Duration;

    fn service() -> (SessionService, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        (SessionService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_open_unknown_token_starts_fresh() {
        let (service, _) = service();
        let session = service.open(Some("nope")).await.unwrap();

        assert!(session.is_new);
        assert_ne!(session.token, "nope");
        assert_eq!(session.data, SessionData::default());
    }

    #[tokio::test]
    async fn test_login_rotates_token_and_keeps_views() {
        let (service, store) = service();

        let mut anon = service.open(None).await.unwrap();
        anon.data.mark_viewed("p1");
        service.save(&anon).await.unwrap();
        let anon = service.open(Some(&anon.token)).await.unwrap();
        assert!(!anon.is_new);

        let signed_in = service.login(&anon, "u1").await.unwrap();
        assert_ne!(signed_in.token, anon.token);
        assert_eq!(signed_in.data.user_id.as_deref(), Some("u1"));
        assert!(signed_in.data.has_viewed("p1"));

        assert!(store.load(&anon.token).await.unwrap().is_none());
        assert!(store.load(&signed_in.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let (service, store) = service();

        let anon = service.open(None).await.unwrap();
        let signed_in = service.login(&anon, "u1").await.unwrap();
        let signed_in = service.open(Some(&signed_in.token)).await.unwrap();

        let after = service.logout(&signed_in).await.unwrap();
        assert!(after.data.user_id.is_none());
        assert!(store.load(&signed_in.token).await.unwrap().is_none());
    }
}
