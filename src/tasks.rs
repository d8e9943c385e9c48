//! Background analysis queue.
//!
//! Essay creation enqueues an essay id and returns immediately. A single
//! worker task drains the queue through [`ReviewService::analyze_essay`] and
//! publishes every outcome on a broadcast channel; failures are logged.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::services::ReviewService;

const OUTCOME_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed { essay_id: String, review_id: String },
    /// The essay was deleted before the worker reached it.
    Missing { essay_id: String },
    Failed { essay_id: String, error: String },
}

impl AnalysisOutcome {
    pub fn essay_id(&self) -> &str {
        match self {
            AnalysisOutcome::Completed { essay_id, .. }
            | AnalysisOutcome::Missing { essay_id }
            | AnalysisOutcome::Failed { essay_id, .. } => essay_id,
        }
    }
}

#[derive(Clone)]
pub struct AnalysisQueue {
    jobs: mpsc::UnboundedSender<String>,
    outcomes: broadcast::Sender<AnalysisOutcome>,
}

impl AnalysisQueue {
    /// Spawns the worker; must be called inside a tokio runtime.
    pub fn start(reviews: Arc<ReviewService>) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<String>();
        let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);
        let publisher = outcomes.clone();

        tokio::spawn(async move {
            while let Some(essay_id) = rx.recv().await {
                let outcome = match reviews.analyze_essay(&essay_id).await {
                    Ok(Some(review)) => AnalysisOutcome::Completed {
                        essay_id,
                        review_id: review.id,
                    },
                    Ok(None) => {
                        tracing::warn!(essay_id = %essay_id, "queued essay no longer exists");
                        AnalysisOutcome::Missing { essay_id }
                    }
                    Err(e) => {
                        tracing::error!(essay_id = %essay_id, error = %e, "background analysis failed");
                        AnalysisOutcome::Failed {
                            essay_id,
                            error: e.to_string(),
                        }
                    }
                };
                // no subscribers is the normal case
                let _ = publisher.send(outcome);
            }
            tracing::debug!("analysis queue closed");
        });

        Self { jobs, outcomes }
    }

    /// Queues an essay for analysis. Returns `false` if the worker is gone.
    pub fn enqueue(&self, essay_id: &str) -> bool {
        match self.jobs.send(essay_id.to_string()) {
            Ok(()) => {
                tracing::info!(essay_id = %essay_id, "queued essay for analysis");
                true
            }
            Err(_) => {
                tracing::error!(essay_id = %essay_id, "analysis worker is not running");
                false
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisOutcome> {
        self.outcomes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MockAnalyzer;
    use crate::db::models::NewEssay;
    use crate::services::ProfileService;
    use crate::store::Stores;

    fn queue(stores: &Stores) -> AnalysisQueue {
        let profiles = Arc::new(ProfileService::new(
            stores.users.clone(),
            stores.profiles.clone(),
            stores.essays.clone(),
            stores.reviews.clone(),
        ));
        AnalysisQueue::start(Arc::new(ReviewService::new(
            stores.essays.clone(),
            stores.reviews.clone(),
            profiles,
            Arc::new(MockAnalyzer::new()),
        )))
    }

    #[tokio::test]
    async fn test_worker_publishes_completion() {
        let stores = Stores::in_memory();
        let queue = queue(&stores);
        let mut outcomes = queue.subscribe();

        let essay = stores
            .essays
            .create_essay(NewEssay {
                title: "T".into(),
                content: "Words here".into(),
                author_id: "u1".into(),
                author_name: "A".into(),
                word_count: 2,
                is_public: true,
            })
            .await
            .unwrap();

        assert!(queue.enqueue(&essay.id));
        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Completed { .. }));
        assert_eq!(outcome.essay_id(), essay.id);
    }

    #[tokio::test]
    async fn test_missing_essay_reports_missing() {
        let stores = Stores::in_memory();
        let queue = queue(&stores);
        let mut outcomes = queue.subscribe();

        queue.enqueue("gone");
        assert_eq!(
            outcomes.recv().await.unwrap(),
            AnalysisOutcome::Missing {
                essay_id: "gone".into()
            }
        );
    }
}
