//! Database entities.

#![allow(missing_docs)]

pub mod category;
pub mod comment;
pub mod post;
pub mod post_attachment;
pub mod post_like;
pub mod user;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use post::Entity as Post;
pub use post_attachment::Entity as PostAttachment;
pub use post_like::Entity as PostLike;
pub use user::Entity as User;
