use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::store::{EssayLikeStore, EssayStore};

pub struct EssayLikeService {
    likes: Arc<dyn EssayLikeStore>,
    essays: Arc<dyn EssayStore>,
}

impl EssayLikeService {
    pub fn new(likes: Arc<dyn EssayLikeStore>, essays: Arc<dyn EssayStore>) -> Self {
        Self { likes, essays }
    }

    pub async fn count(&self, essay_id: &str) -> AppResult<usize> {
        Ok(self.likes.list_likes(essay_id).await?.len())
    }

    /// Flips the like for the pair and returns the new state.
    pub async fn toggle(&self, essay_id: &str, user_id: &str) -> AppResult<bool> {
        if self.essays.get_essay(essay_id).await?.is_none() {
            return Err(AppError::NotFound("Essay not found".to_string()));
        }

        if self.likes.is_liked(essay_id, user_id).await? {
            self.likes.delete_like(essay_id, user_id).await?;
            Ok(false)
        } else {
            // a concurrent toggle may have inserted first; either way it is liked
            self.likes.create_like(essay_id, user_id).await?;
            Ok(true)
        }
    }
}
