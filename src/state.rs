//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::analysis::{Analyzer, MockAnalyzer};
use crate::config::AppConfig;
use crate::crypto::MessageCipher;
use crate::services::{
    AuthService, EssayLikeService, EssayService, FriendshipService, InspirationService,
    MessageService, ProfileService, ReviewService, UserCorrectionService,
};
use crate::session::SessionStore;
use crate::store::Stores;
use crate::tasks::AnalysisQueue;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Stores,
    pub sessions: Arc<SessionStore>,
    pub analysis: AnalysisQueue,
    pub auth: Arc<AuthService>,
    pub essays: Arc<EssayService>,
    pub likes: Arc<EssayLikeService>,
    pub corrections: Arc<UserCorrectionService>,
    pub reviews: Arc<ReviewService>,
    pub profiles: Arc<ProfileService>,
    pub friendships: Arc<FriendshipService>,
    pub messages: Arc<MessageService>,
    pub inspirations: Arc<InspirationService>,
}

impl AppState {
    /// Wires services over the given stores with the bundled analyzer.
    /// Spawns the analysis worker, so it must run inside a tokio runtime.
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        Self::with_analyzer(config, stores, Arc::new(MockAnalyzer::new()))
    }

    pub fn with_analyzer(config: AppConfig, stores: Stores, analyzer: Arc<dyn Analyzer>) -> Self {
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
            analyzer,
        ));
        let analysis = AnalysisQueue::start(reviews.clone());

        Self {
            sessions: Arc::new(SessionStore::new(config.session_ttl_hours)),
            auth: Arc::new(AuthService::new(
                stores.users.clone(),
                stores.profiles.clone(),
            )),
            essays: Arc::new(EssayService::new(
                stores.essays.clone(),
                profiles.clone(),
                analysis.clone(),
            )),
            likes: Arc::new(EssayLikeService::new(
                stores.likes.clone(),
                stores.essays.clone(),
            )),
            corrections: Arc::new(UserCorrectionService::new(
                stores.corrections.clone(),
                stores.essays.clone(),
                stores.profiles.clone(),
            )),
            friendships: Arc::new(FriendshipService::new(
                stores.friendships.clone(),
                stores.users.clone(),
            )),
            messages: Arc::new(MessageService::new(
                stores.messages.clone(),
                stores.users.clone(),
                MessageCipher::new(&config.message_key),
            )),
            inspirations: Arc::new(InspirationService::new(stores.inspirations.clone())),
            reviews,
            profiles,
            analysis,
            stores,
            config: Arc::new(config),
        }
    }

    /// Default configuration over fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(AppConfig::default(), Stores::in_memory())
    }
}
