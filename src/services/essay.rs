use std::sync::Arc;

use serde::Deserialize;

use super::ProfileService;
use crate::db::models::{Essay, EssayFilter, EssayPatch, NewEssay};
use crate::error::{AppError, AppResult, Validator};
use crate::store::EssayStore;
use crate::tasks::AnalysisQueue;

const MAX_TITLE_LEN: usize = 200;

/// Number of whitespace-separated tokens.
pub fn count_words(content: &str) -> i32 {
    content.split_whitespace().count() as i32
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEssayInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEssayInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
}

pub struct EssayService {
    essays: Arc<dyn EssayStore>,
    profiles: Arc<ProfileService>,
    analysis: AnalysisQueue,
}

impl EssayService {
    pub fn new(
        essays: Arc<dyn EssayStore>,
        profiles: Arc<ProfileService>,
        analysis: AnalysisQueue,
    ) -> Self {
        Self {
            essays,
            profiles,
            analysis,
        }
    }

    pub async fn list(&self, filter: EssayFilter) -> AppResult<Vec<Essay>> {
        Ok(self.essays.list_essays(&filter).await?)
    }

    pub async fn get(&self, id: &str) -> AppResult<Essay> {
        self.essays
            .get_essay(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Essay not found".to_string()))
    }

    /// Author fields come from the session user's profile. Public essays are
    /// queued for analysis without waiting on it.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, user_id: &str, input: CreateEssayInput) -> AppResult<Essay> {
        Validator::new()
            .require("title", &input.title)
            .max_len("title", &input.title, MAX_TITLE_LEN)
            .require("content", &input.content)
            .finish()?;

        let author_name = self
            .profiles
            .find(user_id)
            .await?
            .map(|p| p.display_name)
            .unwrap_or_else(|| "Anonymous".to_string());

        let essay = self
            .essays
            .create_essay(NewEssay {
                word_count: count_words(&input.content),
                title: input.title.trim().to_string(),
                content: input.content,
                author_id: user_id.to_string(),
                author_name,
                is_public: input.is_public,
            })
            .await?;

        tracing::info!(essay_id = %essay.id, words = essay.word_count, "essay created");
        if essay.is_public {
            self.analysis.enqueue(&essay.id);
        }

        // The essay is saved; nothing after this point may fail the request.
        self.profiles.refresh_stats_or_warn(user_id).await;
        Ok(essay)
    }

    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateEssayInput,
    ) -> AppResult<Essay> {
        let mut v = Validator::new();
        if let Some(title) = &input.title {
            v.require("title", title).max_len("title", title, MAX_TITLE_LEN);
        }
        if let Some(content) = &input.content {
            v.require("content", content);
        }
        v.finish()?;

        let essay = self.get(id).await?;
        self.ensure_author(&essay, user_id)?;

        let content_changed = input.content.is_some();
        let patch = EssayPatch {
            title: input.title.map(|t| t.trim().to_string()),
            word_count: input.content.as_deref().map(count_words),
            content: input.content,
            is_public: input.is_public,
            is_analyzed: None,
        };

        let updated = self
            .essays
            .update_essay(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Essay not found".to_string()))?;

        if content_changed {
            self.profiles.refresh_stats_or_warn(user_id).await;
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        let essay = self.get(id).await?;
        self.ensure_author(&essay, user_id)?;

        if !self.essays.delete_essay(id).await? {
            return Err(AppError::NotFound("Essay not found".to_string()));
        }
        tracing::info!(essay_id = %id, "essay deleted");
        self.profiles.refresh_stats_or_warn(user_id).await;
        Ok(())
    }

    fn ensure_author(&self, essay: &Essay, user_id: &str) -> AppResult<()> {
        if essay.author_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can modify this essay".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MockAnalyzer;
    use crate::db::models::{NewProfile, ProfilePatch, ProfileStats, UserProfile};
    use crate::services::ReviewService;
    use crate::store::{ProfileStore, StoreError, StoreResult, Stores};
    use crate::tasks::AnalysisOutcome;
    use async_trait::async_trait;

    fn service(stores: &Stores) -> (EssayService, AnalysisQueue) {
        let profiles = Arc::new(ProfileService::new(
            stores.users.clone(),
            stores.profiles.clone(),
            stores.essays.clone(),
            stores.reviews.clone(),
        ));
        let reviews = Arc::new(ReviewService::new(
            stores.essays.clone(),
            stores.reviews.clone(),
            profiles.clone(),
            Arc::new(MockAnalyzer::new()),
        ));
        let queue = AnalysisQueue::start(reviews);
        (
            EssayService::new(stores.essays.clone(), profiles, queue.clone()),
            queue,
        )
    }

    fn input(content: &str, is_public: bool) -> CreateEssayInput {
        CreateEssayInput {
            title: "Title".into(),
            content: content.into(),
            is_public,
        }
    }

    #[test]
    fn test_count_words_ignores_extra_whitespace() {
        assert_eq!(count_words("  one\ttwo\n\nthree  "), 3);
        assert_eq!(count_words("   "), 0);
    }

    #[tokio::test]
    async fn test_create_sets_author_and_word_count() {
        let stores = Stores::in_memory();
        let (essays, _) = service(&stores);
        let essay = essays.create("u1", input("a b  c", false)).await.unwrap();
        assert_eq!(essay.author_id, "u1");
        assert_eq!(essay.author_name, "Anonymous");
        assert_eq!(essay.word_count, 3);
    }

    #[tokio::test]
    async fn test_public_essay_is_analyzed_in_background() {
        let stores = Stores::in_memory();
        let (essays, queue) = service(&stores);
        let mut outcomes = queue.subscribe();

        let essay = essays.create("u1", input("this is it", true)).await.unwrap();
        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Completed { ref essay_id, .. } if *essay_id == essay.id));
        assert!(essays.get(&essay.id).await.unwrap().is_analyzed);
    }

    /// Profile store that serves reads but rejects every stats write.
    struct StatsDown(Arc<dyn ProfileStore>);

    #[async_trait]
    impl ProfileStore for StatsDown {
        async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
            self.0.get_profile(user_id).await
        }
        async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
            self.0.list_profiles().await
        }
        async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile> {
            self.0.create_profile(profile).await
        }
        async fn update_profile(
            &self,
            user_id: &str,
            patch: ProfilePatch,
        ) -> StoreResult<Option<UserProfile>> {
            self.0.update_profile(user_id, patch).await
        }
        async fn update_stats(
            &self,
            _user_id: &str,
            _stats: ProfileStats,
        ) -> StoreResult<Option<UserProfile>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_saved_essay_survives_stats_failure() {
        let stores = Stores::in_memory();
        let profiles = Arc::new(ProfileService::new(
            stores.users.clone(),
            Arc::new(StatsDown(stores.profiles.clone())),
            stores.essays.clone(),
            stores.reviews.clone(),
        ));
        let queue = AnalysisQueue::start(Arc::new(ReviewService::new(
            stores.essays.clone(),
            stores.reviews.clone(),
            profiles.clone(),
            Arc::new(MockAnalyzer::new()),
        )));
        let essays = EssayService::new(stores.essays.clone(), profiles, queue.clone());
        let mut outcomes = queue.subscribe();

        let essay = essays.create("u1", input("still saved", true)).await.unwrap();
        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Completed { ref essay_id, .. } if *essay_id == essay.id));
        assert!(essays.get(&essay.id).await.unwrap().is_analyzed);

        let updated = essays
            .update(
                &essay.id,
                "u1",
                UpdateEssayInput {
                    content: Some("rewritten text here".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.word_count, 3);
        essays.delete(&essay.id, "u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_recomputes_word_count_only_with_content() {
        let stores = Stores::in_memory();
        let (essays, _) = service(&stores);
        let essay = essays.create("u1", input("one two", false)).await.unwrap();

        let renamed = essays
            .update(
                &essay.id,
                "u1",
                UpdateEssayInput {
                    title: Some("New".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.word_count, 2);

        let rewritten = essays
            .update(
                &essay.id,
                "u1",
                UpdateEssayInput {
                    content: Some("one two three four".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rewritten.word_count, 4);
    }

    #[tokio::test]
    async fn test_non_author_cannot_modify() {
        let stores = Stores::in_memory();
        let (essays, _) = service(&stores);
        let essay = essays.create("u1", input("text", false)).await.unwrap();

        let err = essays.delete(&essay.id, "u2").await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        let err = essays
            .update(&essay.id, "u2", UpdateEssayInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let stores = Stores::in_memory();
        let (essays, _) = service(&stores);
        assert_eq!(essays.delete("nope", "u1").await.unwrap_err().code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_missing_title_is_validation_error() {
        let stores = Stores::in_memory();
        let (essays, _) = service(&stores);
        let err = essays
            .create(
                "u1",
                CreateEssayInput {
                    title: " ".into(),
                    content: "x".into(),
                    is_public: false,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::Validation { errors, .. } => assert_eq!(errors[0].field, "title"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
