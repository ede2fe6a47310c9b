//! Core business logic for quill.

pub mod query;
pub mod services;
pub mod text;

pub use query::{PageRequest, Paginated};
pub use services::*;
