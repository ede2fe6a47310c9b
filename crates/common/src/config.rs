//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Listing and page-size settings.
    #[serde(default)]
    pub blog: BlogConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Maximum accepted request body in bytes (uploads included).
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Which session store backs browser sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// In-process map. Sessions are lost on restart.
    #[default]
    Memory,
    /// Redis via `fred`.
    Redis,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Store backend.
    #[serde(default)]
    pub backend: SessionBackend,
    /// Redis connection URL (redis backend only).
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Key prefix for Redis keys.
    #[serde(default = "default_session_prefix")]
    pub prefix: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: i64,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether the cookie carries the `Secure` attribute.
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            redis_url: None,
            prefix: default_session_prefix(),
            ttl_secs: default_session_ttl(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
        }
    }
}

/// Local blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base path for stored files.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// Base URL for serving files.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
        }
    }
}

/// Page sizes for the listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogConfig {
    /// Page size of the public blog pages.
    #[serde(default = "default_public_page_size")]
    pub public_page_size: u64,
    /// Page size of admin listings.
    #[serde(default = "default_admin_page_size")]
    pub admin_page_size: u64,
    /// Default `per_page` of the JSON API.
    #[serde(default = "default_api_per_page")]
    pub api_default_per_page: u64,
    /// Upper bound for `per_page` on the JSON API.
    #[serde(default = "default_api_max_per_page")]
    pub api_max_per_page: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            public_page_size: default_public_page_size(),
            admin_page_size: default_admin_page_size(),
            api_default_per_page: default_api_per_page(),
            api_max_per_page: default_api_max_per_page(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_body_limit() -> usize {
    20 * 1024 * 1024
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_session_prefix() -> String {
    "quill:session".to_string()
}

const fn default_session_ttl() -> i64 {
    // Two weeks
    14 * 24 * 60 * 60
}

fn default_cookie_name() -> String {
    "quill_session".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_storage_url() -> String {
    "/media".to_string()
}

const fn default_public_page_size() -> u64 {
    6
}

const fn default_admin_page_size() -> u64 {
    20
}

const fn default_api_per_page() -> u64 {
    10
}

const fn default_api_max_per_page() -> u64 {
    100
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `QUILL_ENV`)
    /// 3. Environment variables with `QUILL__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("QUILL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("QUILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let raw = r#"
            [server]
            url = "http://localhost:3000"

            [database]
            url = "postgres://localhost/quill"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert_eq!(config.session.cookie_name, "quill_session");
        assert_eq!(config.blog.public_page_size, 6);
        assert_eq!(config.blog.admin_page_size, 20);
        assert_eq!(config.blog.api_default_per_page, 10);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_session_backend_parses_lowercase() {
        let raw = r#"
            [server]
            url = "http://localhost:3000"

            [database]
            url = "postgres://localhost/quill"

            [session]
            backend = "redis"
            redis_url = "redis://localhost:6379"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.session.backend, SessionBackend::Redis);
        assert_eq!(config.session.redis_url.as_deref(), Some("redis://localhost:6379"));
    }
}
