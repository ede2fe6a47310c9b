//! Browser sessions.
//!
//! A session is an opaque token mapped to a small JSON bag holding the
//! signed-in user and the set of posts already counted as viewed. Two
//! backends are provided: an in-process map and Redis.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{AppError, AppResult};

/// Data stored per session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Signed-in user, if any.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Posts whose view has already been counted in this session.
    #[serde(default)]
    pub viewed_posts: Vec<String>,
}

impl SessionData {
    /// Whether the post was already counted in this session.
    #[must_use]
    pub fn has_viewed(&self, post_id: &str) -> bool {
        self.viewed_posts.iter().any(|id| id == post_id)
    }

    /// Record a view. Returns `false` if it was already recorded.
    pub fn mark_viewed(&mut self, post_id: &str) -> bool {
        if self.has_viewed(post_id) {
            return false;
        }
        self.viewed_posts.push(post_id.to_string());
        true
    }
}

/// A session bound to its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque token carried by the client.
    pub token: String,
    /// Session contents.
    pub data: SessionData,
    /// The client has not been handed this token yet.
    pub is_new: bool,
}

/// Session store trait.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session's data, `None` when unknown or expired.
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>>;

    /// Create or replace a session's data, refreshing its lifetime.
    async fn save(&self, token: &str, data: &SessionData) -> AppResult<()>;

    /// Remove a session.
    async fn delete(&self, token: &str) -> AppResult<()>;
}

/// In-process session store.
pub struct MemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, (SessionData, Instant)>>,
}

impl MemorySessionStore {
    /// Create a store whose sessions live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    /// Whether there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                Some((data, expires)) if *expires > now => return Ok(Some(data.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it
        self.entries.write().await.remove(token);
        Ok(None)
    }

    async fn save(&self, token: &str, data: &SessionData) -> AppResult<()> {
        let expires = Instant::now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, at)| *at > Instant::now());
        entries.insert(token.to_string(), (data.clone(), expires));
        Ok(())
    }

    async fn delete(&self, token: &str) -> AppResult<()> {
        self.entries.write().await.remove(token);
        Ok(())
    }
}

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: Arc<RedisClient>,
    prefix: String,
    ttl_secs: i64,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, prefix: String, ttl_secs: i64) -> Self {
        Self {
            redis,
            prefix,
            ttl_secs,
        }
    }

    fn key(&self, token: &str) -> String {
        format!("{}:{token}", self.prefix)
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>> {
        let raw: Option<String> = self
            .redis
            .get(self.key(token))
            .await
            .map_err(|e| AppError::Session(e.to_string()))?;

        let Some(raw) = raw else {
            debug!("Session miss");
            return Ok(None);
        };

        let data = serde_json::from_str(&raw).map_err(|e| AppError::Session(e.to_string()))?;
        Ok(Some(data))
    }

    async fn save(&self, token: &str, data: &SessionData) -> AppResult<()> {
        let raw = serde_json::to_string(data).map_err(|e| AppError::Session(e.to_string()))?;

        self.redis
            .set::<(), _, _>(
                self.key(token),
                raw,
                Some(Expiration::EX(self.ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Session(e.to_string()))
    }

    async fn delete(&self, token: &str) -> AppResult<()> {
        self.redis
            .del::<i64, _>(self.key(token))
            .await
            .map_err(|e| AppError::Session(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fred::interfaces::ClientLike;

    /// Redis used by the ignored store test, from `TEST_REDIS_URL`.
    fn redis_test_url() -> String {
        std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6380".to_string())
    }

    fn redis_client(url: &str) -> RedisClient {
        let config = fred::types::config::Config::from_url(url).unwrap();
        RedisClient::new(config, None, None, None)
    }

    #[test]
    fn test_mark_viewed_once() {
        let mut data = SessionData::default();
        assert!(data.mark_viewed("p1"));
        assert!(!data.mark_viewed("p1"));
        assert!(data.mark_viewed("p2"));
        assert_eq!(data.viewed_posts, vec!["p1", "p2"]);
    }

    #[test]
    fn test_session_data_tolerates_missing_fields() {
        let data: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, SessionData::default());
    }

    #[tokio::test]
    async fn test_memory_store_save_load_delete() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let data = SessionData {
            user_id: Some("u1".to_string()),
            viewed_posts: vec!["p1".to_string()],
        };

        store.save("tok", &data).await.unwrap();
        assert_eq!(store.load("tok").await.unwrap(), Some(data));
        assert_eq!(store.len().await, 1);

        store.delete("tok").await.unwrap();
        assert_eq!(store.load("tok").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_expires() {
        let store = MemorySessionStore::new(Duration::from_millis(1));
        store.save("tok", &SessionData::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.load("tok").await.unwrap(), None);
    }

    #[test]
    fn test_redis_keys_are_prefixed() {
        let store = RedisSessionStore::new(
            Arc::new(redis_client("redis://localhost:6379")),
            "quill:session".to_string(),
            60,
        );
        assert_eq!(store.key("tok"), "quill:session:tok");
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_redis_store_save_load_delete() {
        let client = redis_client(&redis_test_url());
        client.connect();
        client.wait_for_connect().await.unwrap();

        let prefix = format!("quill-test:{}", ulid::Ulid::new());
        let store = RedisSessionStore::new(Arc::new(client), prefix, 60);
        let data = SessionData {
            user_id: Some("u1".to_string()),
            viewed_posts: vec!["p1".to_string(), "p2".to_string()],
        };

        assert_eq!(store.load("tok").await.unwrap(), None);
        store.save("tok", &data).await.unwrap();
        assert_eq!(store.load("tok").await.unwrap(), Some(data));

        store.delete("tok").await.unwrap();
        assert_eq!(store.load("tok").await.unwrap(), None);
        // Deleting a missing session is fine
        store.delete("tok").await.unwrap();
    }
}
