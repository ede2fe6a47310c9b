//! Common utilities and shared types for quill.
//!
//! This crate provides foundational components used across all quill crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Sessions**: Per-browser key-value bags via [`SessionStore`]
//! - **Storage**: Blob storage for featured images and attachments
//!
//! # Example
//!
//! ```no_run
//! use quill_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on {}:{} as {id}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use session::{MemorySessionStore, RedisSessionStore, Session, SessionData, SessionStore};
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
