//! Per-entity store contracts.
//!
//! Every contract has two implementations: [`memory::MemoryStore`] keeps all
//! rows in process (tests and single-process development), and
//! [`postgres::PgStore`] persists through sqlx. The backend is chosen once at
//! startup and handed to the services as a [`Stores`] bundle.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness rule rejected the write.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;
    /// All profiles, most essays first.
    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>>;
    /// Fails with `Conflict` when the user already has a profile.
    async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile>;
    async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> StoreResult<Option<UserProfile>>;
    async fn update_stats(
        &self,
        user_id: &str,
        stats: ProfileStats,
    ) -> StoreResult<Option<UserProfile>>;
}

#[async_trait]
pub trait EssayStore: Send + Sync {
    async fn get_essay(&self, id: &str) -> StoreResult<Option<Essay>>;
    /// Matching essays, most recently updated first.
    async fn list_essays(&self, filter: &EssayFilter) -> StoreResult<Vec<Essay>>;
    async fn create_essay(&self, essay: NewEssay) -> StoreResult<Essay>;
    async fn update_essay(&self, id: &str, patch: EssayPatch) -> StoreResult<Option<Essay>>;
    async fn delete_essay(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserCorrectionStore: Send + Sync {
    async fn list_corrections(&self, essay_id: &str) -> StoreResult<Vec<UserCorrection>>;
    async fn get_correction(&self, id: &str) -> StoreResult<Option<UserCorrection>>;
    async fn create_correction(&self, correction: NewUserCorrection)
        -> StoreResult<UserCorrection>;
    async fn increment_likes(&self, id: &str) -> StoreResult<Option<UserCorrection>>;
}

#[async_trait]
pub trait EssayLikeStore: Send + Sync {
    async fn list_likes(&self, essay_id: &str) -> StoreResult<Vec<EssayLike>>;
    async fn is_liked(&self, essay_id: &str, user_id: &str) -> StoreResult<bool>;
    /// Returns `false` when the pair already existed.
    async fn create_like(&self, essay_id: &str, user_id: &str) -> StoreResult<bool>;
    async fn delete_like(&self, essay_id: &str, user_id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait InspirationStore: Send + Sync {
    /// Public inspirations only, most recently updated first.
    async fn list_inspirations(&self, filter: &InspirationFilter) -> StoreResult<Vec<Inspiration>>;
    async fn get_inspiration(&self, id: &str) -> StoreResult<Option<Inspiration>>;
    async fn create_inspiration(&self, inspiration: NewInspiration) -> StoreResult<Inspiration>;
    async fn count_inspirations(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait FriendshipStore: Send + Sync {
    /// Relationships where the user is either party, most recently updated first.
    async fn list_friendships(
        &self,
        user_id: &str,
        status: Option<FriendshipStatus>,
    ) -> StoreResult<Vec<Friendship>>;
    async fn get_friendship(&self, id: &str) -> StoreResult<Option<Friendship>>;
    /// Any relationship between the two users, in either direction.
    async fn find_between(&self, a: &str, b: &str) -> StoreResult<Option<Friendship>>;
    /// Fails with `Conflict` when the unordered pair already has a row.
    async fn create_friendship(&self, friendship: NewFriendship) -> StoreResult<Friendship>;
    async fn update_status(
        &self,
        id: &str,
        status: FriendshipStatus,
    ) -> StoreResult<Option<Friendship>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Sent and received messages, newest first. With `unread_only`, just
    /// the unread messages addressed to the user.
    async fn list_messages(&self, user_id: &str, unread_only: bool)
        -> StoreResult<Vec<UserMessage>>;
    async fn get_message(&self, id: &str) -> StoreResult<Option<UserMessage>>;
    async fn create_message(&self, message: NewMessage) -> StoreResult<UserMessage>;
    async fn mark_read(&self, id: &str) -> StoreResult<Option<UserMessage>>;
}

#[async_trait]
pub trait PeerReviewStore: Send + Sync {
    async fn list_reviews(&self, essay_id: &str) -> StoreResult<Vec<PeerReview>>;
    async fn get_review(&self, essay_id: &str, reviewer_id: &str)
        -> StoreResult<Option<PeerReview>>;
    async fn get_review_by_id(&self, id: &str) -> StoreResult<Option<PeerReview>>;
    /// Fails with `Conflict` when the (essay, reviewer) pair already has a review.
    async fn create_review(&self, review: NewPeerReview) -> StoreResult<PeerReview>;
    async fn update_review(
        &self,
        id: &str,
        patch: &PeerReviewPatch,
    ) -> StoreResult<Option<PeerReview>>;
    /// Atomic insert-or-overwrite keyed by (essay, reviewer). An existing row
    /// keeps its id, creation time and submission flag; scores and
    /// corrections are replaced.
    async fn upsert_review(&self, review: NewPeerReview) -> StoreResult<PeerReview>;
    /// Appends to an unsubmitted review. `None` when the review is missing
    /// or already submitted.
    async fn append_correction(
        &self,
        id: &str,
        correction: Correction,
    ) -> StoreResult<Option<PeerReview>>;
}

/// The full set of stores handed to the services.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub essays: Arc<dyn EssayStore>,
    pub corrections: Arc<dyn UserCorrectionStore>,
    pub likes: Arc<dyn EssayLikeStore>,
    pub inspirations: Arc<dyn InspirationStore>,
    pub friendships: Arc<dyn FriendshipStore>,
    pub messages: Arc<dyn MessageStore>,
    pub reviews: Arc<dyn PeerReviewStore>,
    pool: Option<PgPool>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            users: store.clone(),
            profiles: store.clone(),
            essays: store.clone(),
            corrections: store.clone(),
            likes: store.clone(),
            inspirations: store.clone(),
            friendships: store.clone(),
            messages: store.clone(),
            reviews: store,
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            profiles: store.clone(),
            essays: store.clone(),
            corrections: store.clone(),
            likes: store.clone(),
            inspirations: store.clone(),
            friendships: store.clone(),
            messages: store.clone(),
            reviews: store,
            pool: Some(pool),
        }
    }

    /// The Postgres pool, when running on the persistent backend.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
