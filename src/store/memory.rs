//! In-process store backed by `HashMap`s.
//!
//! Each table sits behind its own `RwLock`; every check-then-write sequence
//! runs under a single write guard, so the uniqueness rules hold within one
//! process. Nothing is persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::*;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    profiles: RwLock<HashMap<String, UserProfile>>,
    essays: RwLock<HashMap<String, Essay>>,
    corrections: RwLock<HashMap<String, UserCorrection>>,
    likes: RwLock<HashMap<String, EssayLike>>,
    inspirations: RwLock<HashMap<String, Inspiration>>,
    friendships: RwLock<HashMap<String, Friendship>>,
    messages: RwLock<HashMap<String, UserMessage>>,
    reviews: RwLock<HashMap<String, PeerReview>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("Username already taken".to_string()));
        }

        let user = User {
            id: new_id(),
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        let mut profiles: Vec<_> = self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| {
            b.total_essays
                .cmp(&a.total_essays)
                .then_with(|| a.joined_at.cmp(&b.joined_at))
        });
        Ok(profiles)
    }

    async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile> {
        // Keyed by user id: one profile per user.
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.user_id) {
            return Err(StoreError::Conflict("Profile already exists".to_string()));
        }
        if profiles.values().any(|p| p.username == profile.username) {
            return Err(StoreError::Conflict("Username already taken".to_string()));
        }

        let now = Utc::now();
        let profile = UserProfile {
            id: new_id(),
            user_id: profile.user_id,
            username: profile.username,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar: profile.avatar,
            total_essays: 0,
            total_words: 0,
            average_score: 0,
            streak: 0,
            level: 1,
            experience: 0,
            joined_at: now,
            last_active_at: now,
        };
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> StoreResult<Option<UserProfile>> {
        let mut profiles = self.profiles.write().await;
        let Some(profile) = profiles.get_mut(user_id) else {
            return Ok(None);
        };

        if let Some(display_name) = patch.display_name {
            profile.display_name = display_name;
        }
        if let Some(bio) = patch.bio {
            profile.bio = Some(bio);
        }
        if let Some(avatar) = patch.avatar {
            profile.avatar = Some(avatar);
        }
        profile.last_active_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn update_stats(
        &self,
        user_id: &str,
        stats: ProfileStats,
    ) -> StoreResult<Option<UserProfile>> {
        let mut profiles = self.profiles.write().await;
        let Some(profile) = profiles.get_mut(user_id) else {
            return Ok(None);
        };

        profile.total_essays = stats.total_essays;
        profile.total_words = stats.total_words;
        profile.average_score = stats.average_score;
        profile.level = stats.level;
        profile.experience = stats.experience;
        profile.last_active_at = Utc::now();
        Ok(Some(profile.clone()))
    }
}

#[async_trait]
impl EssayStore for MemoryStore {
    async fn get_essay(&self, id: &str) -> StoreResult<Option<Essay>> {
        Ok(self.essays.read().await.get(id).cloned())
    }

    async fn list_essays(&self, filter: &EssayFilter) -> StoreResult<Vec<Essay>> {
        let mut essays: Vec<_> = self
            .essays
            .read()
            .await
            .values()
            .filter(|e| filter.is_public.map_or(true, |p| e.is_public == p))
            .filter(|e| {
                filter
                    .author_id
                    .as_deref()
                    .map_or(true, |author| e.author_id == author)
            })
            .cloned()
            .collect();
        essays.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(essays)
    }

    async fn create_essay(&self, essay: NewEssay) -> StoreResult<Essay> {
        let now = Utc::now();
        let essay = Essay {
            id: new_id(),
            title: essay.title,
            content: essay.content,
            author_id: essay.author_id,
            author_name: essay.author_name,
            word_count: essay.word_count,
            is_public: essay.is_public,
            is_analyzed: false,
            created_at: now,
            updated_at: now,
        };
        self.essays
            .write()
            .await
            .insert(essay.id.clone(), essay.clone());
        Ok(essay)
    }

    async fn update_essay(&self, id: &str, patch: EssayPatch) -> StoreResult<Option<Essay>> {
        let mut essays = self.essays.write().await;
        let Some(essay) = essays.get_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            essay.title = title;
        }
        if let Some(content) = patch.content {
            essay.content = content;
        }
        if let Some(word_count) = patch.word_count {
            essay.word_count = word_count;
        }
        if let Some(is_public) = patch.is_public {
            essay.is_public = is_public;
        }
        if let Some(is_analyzed) = patch.is_analyzed {
            essay.is_analyzed = is_analyzed;
        }
        essay.updated_at = Utc::now();
        Ok(Some(essay.clone()))
    }

    async fn delete_essay(&self, id: &str) -> StoreResult<bool> {
        Ok(self.essays.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl UserCorrectionStore for MemoryStore {
    async fn list_corrections(&self, essay_id: &str) -> StoreResult<Vec<UserCorrection>> {
        let mut corrections: Vec<_> = self
            .corrections
            .read()
            .await
            .values()
            .filter(|c| c.essay_id == essay_id)
            .cloned()
            .collect();
        corrections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(corrections)
    }

    async fn get_correction(&self, id: &str) -> StoreResult<Option<UserCorrection>> {
        Ok(self.corrections.read().await.get(id).cloned())
    }

    async fn create_correction(
        &self,
        correction: NewUserCorrection,
    ) -> StoreResult<UserCorrection> {
        let correction = UserCorrection {
            id: new_id(),
            essay_id: correction.essay_id,
            user_id: correction.user_id,
            user_name: correction.user_name,
            original_text: correction.original_text,
            suggested_text: correction.suggested_text,
            explanation: correction.explanation,
            start_index: correction.start_index,
            end_index: correction.end_index,
            likes: 0,
            created_at: Utc::now(),
        };
        self.corrections
            .write()
            .await
            .insert(correction.id.clone(), correction.clone());
        Ok(correction)
    }

    async fn increment_likes(&self, id: &str) -> StoreResult<Option<UserCorrection>> {
        let mut corrections = self.corrections.write().await;
        Ok(corrections.get_mut(id).map(|c| {
            c.likes += 1;
            c.clone()
        }))
    }
}

#[async_trait]
impl EssayLikeStore for MemoryStore {
    async fn list_likes(&self, essay_id: &str) -> StoreResult<Vec<EssayLike>> {
        Ok(self
            .likes
            .read()
            .await
            .values()
            .filter(|l| l.essay_id == essay_id)
            .cloned()
            .collect())
    }

    async fn is_liked(&self, essay_id: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self
            .likes
            .read()
            .await
            .values()
            .any(|l| l.essay_id == essay_id && l.user_id == user_id))
    }

    async fn create_like(&self, essay_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut likes = self.likes.write().await;
        if likes
            .values()
            .any(|l| l.essay_id == essay_id && l.user_id == user_id)
        {
            return Ok(false);
        }

        let like = EssayLike {
            id: new_id(),
            essay_id: essay_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        likes.insert(like.id.clone(), like);
        Ok(true)
    }

    async fn delete_like(&self, essay_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut likes = self.likes.write().await;
        let before = likes.len();
        likes.retain(|_, l| !(l.essay_id == essay_id && l.user_id == user_id));
        Ok(likes.len() < before)
    }
}

#[async_trait]
impl InspirationStore for MemoryStore {
    async fn list_inspirations(
        &self,
        filter: &InspirationFilter,
    ) -> StoreResult<Vec<Inspiration>> {
        let mut items: Vec<_> = self
            .inspirations
            .read()
            .await
            .values()
            .filter(|i| i.is_public)
            .filter(|i| filter.category.as_deref().map_or(true, |c| i.category == c))
            .filter(|i| filter.kind.as_deref().map_or(true, |k| i.kind == k))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    async fn get_inspiration(&self, id: &str) -> StoreResult<Option<Inspiration>> {
        Ok(self.inspirations.read().await.get(id).cloned())
    }

    async fn create_inspiration(&self, inspiration: NewInspiration) -> StoreResult<Inspiration> {
        let now = Utc::now();
        let inspiration = Inspiration {
            id: new_id(),
            title: inspiration.title,
            author: inspiration.author,
            content: inspiration.content,
            category: inspiration.category,
            kind: inspiration.kind,
            source: inspiration.source,
            tags: inspiration.tags,
            difficulty: inspiration.difficulty,
            word_count: inspiration.word_count,
            read_time: inspiration.read_time,
            is_public: inspiration.is_public,
            created_at: now,
            updated_at: now,
        };
        self.inspirations
            .write()
            .await
            .insert(inspiration.id.clone(), inspiration.clone());
        Ok(inspiration)
    }

    async fn count_inspirations(&self) -> StoreResult<i64> {
        Ok(self.inspirations.read().await.len() as i64)
    }
}

#[async_trait]
impl FriendshipStore for MemoryStore {
    async fn list_friendships(
        &self,
        user_id: &str,
        status: Option<FriendshipStatus>,
    ) -> StoreResult<Vec<Friendship>> {
        let mut items: Vec<_> = self
            .friendships
            .read()
            .await
            .values()
            .filter(|f| f.involves(user_id))
            .filter(|f| status.map_or(true, |s| f.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    async fn get_friendship(&self, id: &str) -> StoreResult<Option<Friendship>> {
        Ok(self.friendships.read().await.get(id).cloned())
    }

    async fn find_between(&self, a: &str, b: &str) -> StoreResult<Option<Friendship>> {
        Ok(self
            .friendships
            .read()
            .await
            .values()
            .find(|f| f.connects(a, b))
            .cloned())
    }

    async fn create_friendship(&self, friendship: NewFriendship) -> StoreResult<Friendship> {
        let mut items = self.friendships.write().await;
        if items
            .values()
            .any(|f| f.connects(&friendship.requester_id, &friendship.addressee_id))
        {
            return Err(StoreError::Conflict(
                "A relationship between these users already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let friendship = Friendship {
            id: new_id(),
            requester_id: friendship.requester_id,
            addressee_id: friendship.addressee_id,
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        items.insert(friendship.id.clone(), friendship.clone());
        Ok(friendship)
    }

    async fn update_status(
        &self,
        id: &str,
        status: FriendshipStatus,
    ) -> StoreResult<Option<Friendship>> {
        let mut items = self.friendships.write().await;
        Ok(items.get_mut(id).map(|f| {
            f.status = status;
            f.updated_at = Utc::now();
            f.clone()
        }))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn list_messages(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> StoreResult<Vec<UserMessage>> {
        let mut items: Vec<_> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| {
                if unread_only {
                    m.to_user_id == user_id && !m.is_read
                } else {
                    m.to_user_id == user_id || m.from_user_id == user_id
                }
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get_message(&self, id: &str) -> StoreResult<Option<UserMessage>> {
        Ok(self.messages.read().await.get(id).cloned())
    }

    async fn create_message(&self, message: NewMessage) -> StoreResult<UserMessage> {
        let message = UserMessage {
            id: new_id(),
            from_user_id: message.from_user_id,
            to_user_id: message.to_user_id,
            content: message.content,
            message_type: message.message_type,
            related_essay_id: message.related_essay_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.messages
            .write()
            .await
            .insert(message.id.clone(), message.clone());
        Ok(message)
    }

    async fn mark_read(&self, id: &str) -> StoreResult<Option<UserMessage>> {
        let mut items = self.messages.write().await;
        Ok(items.get_mut(id).map(|m| {
            m.is_read = true;
            m.clone()
        }))
    }
}

#[async_trait]
impl PeerReviewStore for MemoryStore {
    async fn list_reviews(&self, essay_id: &str) -> StoreResult<Vec<PeerReview>> {
        let mut items: Vec<_> = self
            .reviews
            .read()
            .await
            .values()
            .filter(|r| r.essay_id == essay_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get_review(
        &self,
        essay_id: &str,
        reviewer_id: &str,
    ) -> StoreResult<Option<PeerReview>> {
        Ok(self
            .reviews
            .read()
            .await
            .values()
            .find(|r| r.essay_id == essay_id && r.reviewer_id == reviewer_id)
            .cloned())
    }

    async fn get_review_by_id(&self, id: &str) -> StoreResult<Option<PeerReview>> {
        Ok(self.reviews.read().await.get(id).cloned())
    }

    async fn create_review(&self, review: NewPeerReview) -> StoreResult<PeerReview> {
        let mut items = self.reviews.write().await;
        if items
            .values()
            .any(|r| r.essay_id == review.essay_id && r.reviewer_id == review.reviewer_id)
        {
            return Err(StoreError::Conflict(
                "A review by this reviewer already exists for this essay".to_string(),
            ));
        }

        let review = build_review(review);
        items.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    async fn update_review(
        &self,
        id: &str,
        patch: &PeerReviewPatch,
    ) -> StoreResult<Option<PeerReview>> {
        let mut items = self.reviews.write().await;
        Ok(items.get_mut(id).map(|r| {
            patch.apply(r);
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn upsert_review(&self, review: NewPeerReview) -> StoreResult<PeerReview> {
        let mut items = self.reviews.write().await;
        let existing = items
            .values_mut()
            .find(|r| r.essay_id == review.essay_id && r.reviewer_id == review.reviewer_id);

        if let Some(existing) = existing {
            existing.scores = review.scores;
            existing.corrections = review.corrections;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let review = build_review(review);
        items.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    async fn append_correction(
        &self,
        id: &str,
        correction: Correction,
    ) -> StoreResult<Option<PeerReview>> {
        let mut items = self.reviews.write().await;
        match items.get_mut(id) {
            Some(r) if !r.is_submitted => {
                r.corrections.push(correction);
                r.updated_at = Utc::now();
                Ok(Some(r.clone()))
            }
            _ => Ok(None),
        }
    }
}

fn build_review(review: NewPeerReview) -> PeerReview {
    let now = Utc::now();
    PeerReview {
        id: new_id(),
        essay_id: review.essay_id,
        reviewer_id: review.reviewer_id,
        scores: review.scores,
        corrections: review.corrections,
        review_comment: review.review_comment,
        is_submitted: review.is_submitted,
        created_at: now,
        updated_at: now,
    }
}
