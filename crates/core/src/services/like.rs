//! Like service.

use quill_common::{AppResult, IdGenerator};
use quill_db::repositories::{LikeRepository, LikeToggle};
use tracing::info;

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(like_repo: LikeRepository) -> Self {
        Self {
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like the post, or take the like back if there already is one.
    pub async fn toggle(&self, user_id: &str, post_id: &str) -> AppResult<LikeToggle> {
        let result = self
            .like_repo
            .toggle(self.id_gen.generate(), user_id, post_id)
            .await?;

        info!(
            user_id = %user_id,
            post_id = %post_id,
            liked = result.liked,
            like_count = result.like_count,
            "Like toggled"
        );
        Ok(result)
    }

    /// Whether the user likes the post.
    pub async fn is_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.like_repo.exists(user_id, post_id).await
    }
}
