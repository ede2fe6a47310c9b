//! Business logic services.

#![allow(missing_docs)]

pub mod admin;
pub mod category;
pub mod comment;
pub mod like;
pub mod post;
pub mod session;
pub mod user;

pub use admin::{
    AdminCreateUserInput, AdminService, AdminUpdateUserInput, DashboardStats, UserDetail,
    is_admin, require_admin,
};
pub use category::{CategoryInput, CategoryService, CategoryWithCount};
pub use comment::{
    CommentFilters, CommentService, CommentStats, CommentView, Moderation, ModerationItem,
    ThreadComment,
};
pub use like::LikeService;
pub use post::{
    CategoryRef, CreatePostInput, FileUpload, PostFilters, PostService, PostSummary,
    UpdatePostInput,
};
pub use session::SessionService;
pub use user::{RegisterInput, UpdateProfileInput, UserService};
