//! Automated and human peer reviews.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ProfileService;
use crate::analysis::{AnalysisError, Analyzer};
use crate::db::models::{
    Correction, Essay, EssayFilter, EssayPatch, NewPeerReview, PeerReview, PeerReviewPatch,
    ReviewScores, AI_REVIEWER_ID,
};
use crate::error::{AppError, AppResult, Validator};
use crate::store::{EssayStore, PeerReviewStore, StoreError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewInput {
    pub grammar_score: Option<i32>,
    pub style_score: Option<i32>,
    pub clarity_score: Option<i32>,
    pub structure_score: Option<i32>,
    pub content_score: Option<i32>,
    pub research_score: Option<i32>,
    pub overall_score: Option<i32>,
    pub review_comment: Option<String>,
}

impl PeerReviewInput {
    /// Unset categories fall back to the defaults; an unset overall score is
    /// the sum of the six categories.
    fn scores(&self) -> ReviewScores {
        let d = ReviewScores::default();
        let grammar_score = self.grammar_score.unwrap_or(d.grammar_score);
        let style_score = self.style_score.unwrap_or(d.style_score);
        let clarity_score = self.clarity_score.unwrap_or(d.clarity_score);
        let structure_score = self.structure_score.unwrap_or(d.structure_score);
        let content_score = self.content_score.unwrap_or(d.content_score);
        let research_score = self.research_score.unwrap_or(d.research_score);
        ReviewScores {
            grammar_score,
            style_score,
            clarity_score,
            structure_score,
            content_score,
            research_score,
            overall_score: self.overall_score.unwrap_or(
                grammar_score
                    + style_score
                    + clarity_score
                    + structure_score
                    + content_score
                    + research_score,
            ),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewUpdate {
    pub grammar_score: Option<i32>,
    pub style_score: Option<i32>,
    pub clarity_score: Option<i32>,
    pub structure_score: Option<i32>,
    pub content_score: Option<i32>,
    pub research_score: Option<i32>,
    pub overall_score: Option<i32>,
    pub review_comment: Option<String>,
    pub is_submitted: Option<bool>,
}

impl From<PeerReviewUpdate> for PeerReviewPatch {
    fn from(u: PeerReviewUpdate) -> Self {
        PeerReviewPatch {
            grammar_score: u.grammar_score,
            style_score: u.style_score,
            clarity_score: u.clarity_score,
            structure_score: u.structure_score,
            content_score: u.content_score,
            research_score: u.research_score,
            overall_score: u.overall_score,
            review_comment: u.review_comment,
            is_submitted: u.is_submitted,
        }
    }
}

/// Counters reported by a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct ReviewService {
    essays: Arc<dyn EssayStore>,
    reviews: Arc<dyn PeerReviewStore>,
    profiles: Arc<ProfileService>,
    analyzer: Arc<dyn Analyzer>,
}

impl ReviewService {
    pub fn new(
        essays: Arc<dyn EssayStore>,
        reviews: Arc<dyn PeerReviewStore>,
        profiles: Arc<ProfileService>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            essays,
            reviews,
            profiles,
            analyzer,
        }
    }

    /// Runs the analyzer and upserts the AI review. `None` when the essay
    /// does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn analyze_essay(&self, essay_id: &str) -> AppResult<Option<PeerReview>> {
        let Some(essay) = self.essays.get_essay(essay_id).await? else {
            return Ok(None);
        };
        self.run_analysis(&essay).await.map(Some)
    }

    /// Analyzes every public essay that has no AI review yet. One essay's
    /// failure is counted, never fatal to the batch.
    pub async fn batch_analyze(&self) -> AppResult<BatchStats> {
        let essays = self
            .essays
            .list_essays(&EssayFilter {
                is_public: Some(true),
                ..Default::default()
            })
            .await?;

        let mut stats = BatchStats {
            total: essays.len(),
            ..Default::default()
        };

        for essay in &essays {
            match self.reviews.get_review(&essay.id, AI_REVIEWER_ID).await {
                Ok(Some(_)) => {
                    stats.skipped += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(essay_id = %essay.id, error = %e, "batch lookup failed");
                    stats.failed += 1;
                    continue;
                }
            }

            match self.run_analysis(essay).await {
                Ok(_) => stats.success += 1,
                Err(e) => {
                    tracing::error!(essay_id = %essay.id, error = %e, "batch analysis failed");
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            total = stats.total,
            success = stats.success,
            failed = stats.failed,
            skipped = stats.skipped,
            "batch analysis finished"
        );
        Ok(stats)
    }

    async fn run_analysis(&self, essay: &Essay) -> AppResult<PeerReview> {
        tracing::debug!(essay_id = %essay.id, "analyzing essay");

        let result = self
            .analyzer
            .analyze(&essay.title, &essay.content)
            .await
            .map_err(|e| match e {
                AnalysisError::Unavailable(reason) => {
                    tracing::warn!(essay_id = %essay.id, reason = %reason, "analyzer unavailable");
                    AppError::Unexpected(format!("Analyzer unavailable: {reason}"))
                }
            })?;

        let review = self
            .reviews
            .upsert_review(NewPeerReview {
                essay_id: essay.id.clone(),
                reviewer_id: AI_REVIEWER_ID.to_string(),
                scores: result.scores,
                corrections: result.corrections,
                review_comment: None,
                is_submitted: true,
            })
            .await?;

        self.essays
            .update_essay(
                &essay.id,
                EssayPatch {
                    is_analyzed: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        self.profiles.refresh_stats_or_warn(&essay.author_id).await;

        tracing::info!(
            essay_id = %essay.id,
            review_id = %review.id,
            overall = review.scores.overall_score,
            "essay analyzed"
        );
        Ok(review)
    }

    pub async fn list_for_essay(&self, essay_id: &str) -> AppResult<Vec<PeerReview>> {
        Ok(self.reviews.list_reviews(essay_id).await?)
    }

    pub async fn find(&self, essay_id: &str, reviewer_id: &str) -> AppResult<Option<PeerReview>> {
        Ok(self.reviews.get_review(essay_id, reviewer_id).await?)
    }

    pub async fn get(&self, id: &str) -> AppResult<PeerReview> {
        self.reviews
            .get_review_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Peer review not found".to_string()))
    }

    /// Starts a review of someone else's essay. An existing review by the
    /// same reviewer is returned unchanged.
    pub async fn create_peer_review(
        &self,
        essay_id: &str,
        reviewer_id: &str,
        input: PeerReviewInput,
    ) -> AppResult<PeerReview> {
        let essay = self
            .essays
            .get_essay(essay_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Essay not found".to_string()))?;

        if essay.author_id == reviewer_id {
            return Err(AppError::Forbidden(
                "You cannot review your own essay".to_string(),
            ));
        }

        if let Some(existing) = self.reviews.get_review(essay_id, reviewer_id).await? {
            return Ok(existing);
        }

        let created = self
            .reviews
            .create_review(NewPeerReview {
                essay_id: essay_id.to_string(),
                reviewer_id: reviewer_id.to_string(),
                scores: input.scores(),
                corrections: Vec::new(),
                review_comment: input.review_comment,
                is_submitted: false,
            })
            .await;

        match created {
            Ok(review) => Ok(review),
            // lost a race with a concurrent create for the same pair
            Err(StoreError::Conflict(_)) => self
                .reviews
                .get_review(essay_id, reviewer_id)
                .await?
                .ok_or_else(|| AppError::Unexpected("review vanished after conflict".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_review(
        &self,
        id: &str,
        user_id: &str,
        update: PeerReviewUpdate,
    ) -> AppResult<PeerReview> {
        let review = self.get(id).await?;
        if review.reviewer_id != user_id {
            return Err(AppError::Forbidden(
                "Only the reviewer can update this review".to_string(),
            ));
        }
        if review.is_submitted && update.is_submitted == Some(false) {
            return Err(AppError::Conflict(
                "A submitted review cannot be reopened".to_string(),
            ));
        }

        let patch = PeerReviewPatch::from(update);
        self.reviews
            .update_review(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Peer review not found".to_string()))
    }

    /// Appends one correction; corrections freeze once the review is submitted.
    pub async fn add_correction(
        &self,
        id: &str,
        user_id: &str,
        correction: Correction,
    ) -> AppResult<PeerReview> {
        Validator::new()
            .check(
                correction.text_start_index >= 0,
                "textStartIndex",
                "textStartIndex must not be negative",
            )
            .check(
                correction.text_end_index >= correction.text_start_index,
                "textEndIndex",
                "textEndIndex must not precede textStartIndex",
            )
            .require("comment", &correction.comment)
            .finish()?;

        let review = self.get(id).await?;
        if review.reviewer_id != user_id {
            return Err(AppError::Forbidden(
                "Only the reviewer can add corrections".to_string(),
            ));
        }
        if review.is_submitted {
            return Err(AppError::Conflict(
                "Cannot add corrections to a submitted review".to_string(),
            ));
        }

        // the store re-checks the flag, so a concurrent submit still wins
        self.reviews
            .append_correction(id, correction)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Cannot add corrections to a submitted review".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, MockAnalyzer};
    use crate::db::models::{NewEssay, ReviewCategory};
    use crate::store::Stores;

    fn service(stores: &Stores) -> ReviewService {
        let profiles = Arc::new(ProfileService::new(
            stores.users.clone(),
            stores.profiles.clone(),
            stores.essays.clone(),
            stores.reviews.clone(),
        ));
        ReviewService::new(
            stores.essays.clone(),
            stores.reviews.clone(),
            profiles,
            Arc::new(MockAnalyzer::new()),
        )
    }

    async fn essay(stores: &Stores, author: &str, is_public: bool) -> Essay {
        stores
            .essays
            .create_essay(NewEssay {
                title: "T".into(),
                content: "However, it's very important. In conclusion, this matters.".into(),
                author_id: author.into(),
                author_name: "Author".into(),
                word_count: 8,
                is_public,
            })
            .await
            .unwrap()
    }

    fn correction() -> Correction {
        Correction {
            category: ReviewCategory::Grammar,
            selected_text: "However".into(),
            text_start_index: 0,
            text_end_index: 7,
            comment: "comma".into(),
        }
    }

    struct OfflineAnalyzer;

    #[async_trait::async_trait]
    impl Analyzer for OfflineAnalyzer {
        async fn analyze(&self, _title: &str, _content: &str) -> Result<AnalysisResult, AnalysisError> {
            Err(AnalysisError::Unavailable("model endpoint down".into()))
        }
    }

    #[tokio::test]
    async fn test_unavailable_analyzer_fails_without_marking_essay() {
        let stores = Stores::in_memory();
        let profiles = Arc::new(ProfileService::new(
            stores.users.clone(),
            stores.profiles.clone(),
            stores.essays.clone(),
            stores.reviews.clone(),
        ));
        let reviews = ReviewService::new(
            stores.essays.clone(),
            stores.reviews.clone(),
            profiles,
            Arc::new(OfflineAnalyzer),
        );
        let e = essay(&stores, "u1", true).await;

        let err = reviews.analyze_essay(&e.id).await.unwrap_err();
        assert_eq!(err.code(), "UNEXPECTED_ERROR");
        assert!(!stores.essays.get_essay(&e.id).await.unwrap().unwrap().is_analyzed);

        let stats = reviews.batch_analyze().await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success, 0);
        assert!(stores.reviews.list_reviews(&e.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_analysis_keeps_single_ai_review() {
        let stores = Stores::in_memory();
        let reviews = Arc::new(service(&stores));
        let e = essay(&stores, "u1", true).await;

        let (a, b) = tokio::join!(reviews.analyze_essay(&e.id), reviews.analyze_essay(&e.id));
        let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());
        assert_eq!(a.id, b.id);

        let stored = stores.reviews.list_reviews(&e.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, a.id);
    }

    #[tokio::test]
    async fn test_analyze_twice_keeps_single_ai_review() {
        let stores = Stores::in_memory();
        let reviews = service(&stores);
        let e = essay(&stores, "u1", true).await;

        let first = reviews.analyze_essay(&e.id).await.unwrap().unwrap();
        let second = reviews.analyze_essay(&e.id).await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.scores.overall_score, 920);
        assert_eq!(stores.reviews.list_reviews(&e.id).await.unwrap().len(), 1);
        assert!(stores.essays.get_essay(&e.id).await.unwrap().unwrap().is_analyzed);
    }

    #[tokio::test]
    async fn test_analyze_missing_essay_is_none() {
        let stores = Stores::in_memory();
        assert!(service(&stores).analyze_essay("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_skips_reviewed_and_private() {
        let stores = Stores::in_memory();
        let reviews = service(&stores);
        let reviewed = essay(&stores, "u1", true).await;
        essay(&stores, "u1", true).await;
        essay(&stores, "u1", false).await;
        reviews.analyze_essay(&reviewed.id).await.unwrap();

        let stats = reviews.batch_analyze().await.unwrap();
        assert_eq!(
            stats,
            BatchStats {
                total: 2,
                success: 1,
                failed: 0,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_self_review_is_forbidden() {
        let stores = Stores::in_memory();
        let e = essay(&stores, "author", true).await;
        let err = service(&stores)
            .create_peer_review(&e.id, "author", PeerReviewInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_second_create_returns_existing() {
        let stores = Stores::in_memory();
        let reviews = service(&stores);
        let e = essay(&stores, "author", true).await;
        let first = reviews
            .create_peer_review(&e.id, "peer", PeerReviewInput::default())
            .await
            .unwrap();
        let again = reviews
            .create_peer_review(
                &e.id,
                "peer",
                PeerReviewInput {
                    grammar_score: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.scores.grammar_score, 100);
        assert_eq!(first.scores.overall_score, 600);
    }

    #[tokio::test]
    async fn test_corrections_freeze_after_submit() {
        let stores = Stores::in_memory();
        let reviews = service(&stores);
        let e = essay(&stores, "author", true).await;
        let review = reviews
            .create_peer_review(&e.id, "peer", PeerReviewInput::default())
            .await
            .unwrap();

        reviews.add_correction(&review.id, "peer", correction()).await.unwrap();
        reviews
            .update_review(
                &review.id,
                "peer",
                PeerReviewUpdate {
                    is_submitted: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = reviews
            .add_correction(&review.id, "peer", correction())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(reviews.get(&review.id).await.unwrap().corrections.len(), 1);

        let err = reviews
            .update_review(
                &review.id,
                "peer",
                PeerReviewUpdate {
                    is_submitted: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn test_only_reviewer_may_add_corrections() {
        let stores = Stores::in_memory();
        let reviews = service(&stores);
        let e = essay(&stores, "author", true).await;
        let review = reviews
            .create_peer_review(&e.id, "peer", PeerReviewInput::default())
            .await
            .unwrap();
        let err = reviews
            .add_correction(&review.id, "someone", correction())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
}
