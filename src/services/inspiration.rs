use std::sync::Arc;

use super::seed::builtin_inspirations;
use crate::db::models::{Inspiration, InspirationFilter};
use crate::error::{AppError, AppResult};
use crate::store::InspirationStore;

/// Read-only curated excerpts.
pub struct InspirationService {
    inspirations: Arc<dyn InspirationStore>,
}

impl InspirationService {
    pub fn new(inspirations: Arc<dyn InspirationStore>) -> Self {
        Self { inspirations }
    }

    pub async fn list(&self, filter: InspirationFilter) -> AppResult<Vec<Inspiration>> {
        Ok(self.inspirations.list_inspirations(&filter).await?)
    }

    pub async fn get(&self, id: &str) -> AppResult<Inspiration> {
        self.inspirations
            .get_inspiration(id)
            .await?
            .filter(|i| i.is_public)
            .ok_or_else(|| AppError::NotFound("Inspiration not found".to_string()))
    }

    /// Loads the built-in excerpts into an empty store. Returns how many
    /// were inserted.
    pub async fn seed_if_empty(&self) -> AppResult<usize> {
        if self.inspirations.count_inspirations().await? > 0 {
            tracing::debug!("inspirations already present, skipping seed");
            return Ok(0);
        }

        let seed = builtin_inspirations();
        let count = seed.len();
        for item in seed {
            self.inspirations.create_inspiration(item).await?;
        }
        tracing::info!(count, "seeded inspirations");
        Ok(count)
    }
}
