//! Database repositories.

pub mod attachment;
pub mod category;
pub mod comment;
pub mod like;
pub mod post;
pub mod search;
pub mod user;

pub use attachment::AttachmentRepository;
pub use category::CategoryRepository;
pub use comment::{CommentQuery, CommentRepository};
pub use like::{LikeRepository, LikeToggle};
pub use post::{PostQuery, PostRepository, PostSearchScope};
pub use user::{UserFilter, UserRepository};
