use std::sync::Arc;

use serde::Deserialize;

use crate::analysis::utf16_len;
use crate::db::models::{NewUserCorrection, UserCorrection};
use crate::error::{AppError, AppResult, Validator};
use crate::store::{EssayStore, ProfileStore, UserCorrectionStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCorrectionInput {
    pub original_text: String,
    pub suggested_text: String,
    #[serde(default)]
    pub explanation: String,
    pub start_index: i32,
    pub end_index: i32,
}

/// Reader-suggested edits anchored to a span of the essay content.
pub struct UserCorrectionService {
    corrections: Arc<dyn UserCorrectionStore>,
    essays: Arc<dyn EssayStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl UserCorrectionService {
    pub fn new(
        corrections: Arc<dyn UserCorrectionStore>,
        essays: Arc<dyn EssayStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            corrections,
            essays,
            profiles,
        }
    }

    pub async fn list(&self, essay_id: &str) -> AppResult<Vec<UserCorrection>> {
        Ok(self.corrections.list_corrections(essay_id).await?)
    }

    pub async fn create(
        &self,
        essay_id: &str,
        user_id: &str,
        input: UserCorrectionInput,
    ) -> AppResult<UserCorrection> {
        let essay = self
            .essays
            .get_essay(essay_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Essay not found".to_string()))?;

        // Spans index the content the way browser clients slice it.
        let content_len = utf16_len(&essay.content) as i64;
        let (start, end) = (input.start_index as i64, input.end_index as i64);
        Validator::new()
            .require("originalText", &input.original_text)
            .require("suggestedText", &input.suggested_text)
            .check(start >= 0, "startIndex", "startIndex must not be negative")
            .check(end >= start, "endIndex", "endIndex must not precede startIndex")
            .check(
                end <= content_len,
                "endIndex",
                "endIndex must fall within the essay content",
            )
            .finish()?;

        let user_name = self
            .profiles
            .get_profile(user_id)
            .await?
            .map(|p| p.display_name)
            .unwrap_or_else(|| "Anonymous".to_string());

        let correction = self
            .corrections
            .create_correction(NewUserCorrection {
                essay_id: essay.id,
                user_id: user_id.to_string(),
                user_name,
                original_text: input.original_text,
                suggested_text: input.suggested_text,
                explanation: input.explanation,
                start_index: input.start_index,
                end_index: input.end_index,
            })
            .await?;
        Ok(correction)
    }

    pub async fn like(&self, id: &str) -> AppResult<UserCorrection> {
        self.corrections
            .increment_likes(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Correction not found".to_string()))
    }
}
