use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use crate::db::models::{
    EssayFilter, NewProfile, ProfilePatch, ProfileStats, UserProfile, AI_REVIEWER_ID,
};
use crate::error::{AppError, AppResult, Validator};
use crate::store::{EssayStore, PeerReviewStore, ProfileStore, UserStore};

/// Experience points needed per level.
const XP_PER_LEVEL: i32 = 1000;

/// Strip markup from a user-supplied bio.
pub(crate) fn sanitize_bio(bio: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(bio)
        .to_string()
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileInput {
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

pub struct ProfileService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
    essays: Arc<dyn EssayStore>,
    reviews: Arc<dyn PeerReviewStore>,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserStore>,
        profiles: Arc<dyn ProfileStore>,
        essays: Arc<dyn EssayStore>,
        reviews: Arc<dyn PeerReviewStore>,
    ) -> Self {
        Self {
            users,
            profiles,
            essays,
            reviews,
        }
    }

    pub async fn get(&self, user_id: &str) -> AppResult<UserProfile> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    /// Profile lookup that tolerates a missing row.
    pub async fn find(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.get_profile(user_id).await?)
    }

    pub async fn list(&self) -> AppResult<Vec<UserProfile>> {
        Ok(self.profiles.list_profiles().await?)
    }

    /// Creates the session user's profile; a user has at most one.
    pub async fn create(&self, user_id: &str, input: CreateProfileInput) -> AppResult<UserProfile> {
        Validator::new()
            .require("displayName", &input.display_name)
            .max_len("displayName", &input.display_name, 100)
            .max_len("bio", input.bio.as_deref().unwrap_or_default(), 1000)
            .finish()?;

        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.profiles.get_profile(user_id).await?.is_some() {
            return Err(AppError::Conflict("Profile already exists".to_string()));
        }

        let profile = self
            .profiles
            .create_profile(NewProfile {
                user_id: user.id,
                username: user.username,
                display_name: input.display_name.trim().to_string(),
                bio: input.bio.as_deref().map(sanitize_bio),
                avatar: input.avatar,
            })
            .await?;
        Ok(profile)
    }

    pub async fn update(
        &self,
        target_user_id: &str,
        requesting_user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<UserProfile> {
        if target_user_id != requesting_user_id {
            return Err(AppError::Forbidden(
                "You can only update your own profile".to_string(),
            ));
        }

        let mut v = Validator::new();
        if let Some(name) = &input.display_name {
            v.require("displayName", name).max_len("displayName", name, 100);
        }
        if let Some(bio) = &input.bio {
            v.max_len("bio", bio, 1000);
        }
        v.finish()?;

        let patch = ProfilePatch {
            display_name: input.display_name.map(|n| n.trim().to_string()),
            bio: input.bio.as_deref().map(sanitize_bio),
            avatar: input.avatar,
        };

        self.profiles
            .update_profile(target_user_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    /// Recompute the derived writing statistics from the author's essays and
    /// their automated reviews.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_stats(&self, user_id: &str) -> AppResult<()> {
        let essays = self
            .essays
            .list_essays(&EssayFilter {
                author_id: Some(user_id.to_string()),
                ..Default::default()
            })
            .await?;

        let total_words = sum_words(essays.iter().map(|e| e.word_count));

        let mut scores = Vec::new();
        for essay in essays.iter().filter(|e| e.is_analyzed) {
            if let Some(review) = self.reviews.get_review(&essay.id, AI_REVIEWER_ID).await? {
                scores.push(review.scores.overall_score);
            }
        }

        let stats = compute_stats(essays.len() as i32, total_words, &scores);
        if self.profiles.update_stats(user_id, stats).await?.is_none() {
            tracing::debug!("no profile to refresh");
        }
        Ok(())
    }

    /// Stats are derived data: a failed refresh is logged and picked up by
    /// the author's next write instead of failing the caller.
    pub async fn refresh_stats_or_warn(&self, user_id: &str) {
        if let Err(e) = self.refresh_stats(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "profile stats refresh failed");
        }
    }
}

/// Summed wide, saturating at `i32::MAX`.
fn sum_words(counts: impl Iterator<Item = i32>) -> i32 {
    let total: i64 = counts.map(i64::from).sum();
    i32::try_from(total).unwrap_or(i32::MAX)
}

fn compute_stats(total_essays: i32, total_words: i32, scores: &[i32]) -> ProfileStats {
    let average_score = if scores.is_empty() {
        0
    } else {
        let sum: i64 = scores.iter().map(|s| *s as i64).sum();
        (sum as f64 / scores.len() as f64).round() as i32
    };

    ProfileStats {
        total_essays,
        total_words,
        average_score,
        level: 1 + total_words / XP_PER_LEVEL,
        experience: total_words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::store::Stores;

    fn service(stores: &Stores) -> ProfileService {
        ProfileService::new(
            stores.users.clone(),
            stores.profiles.clone(),
            stores.essays.clone(),
            stores.reviews.clone(),
        )
    }

    #[test]
    fn test_sanitize_bio_strips_markup() {
        assert_eq!(
            sanitize_bio("<script>alert(1)</script>I <b>write</b>"),
            "I write"
        );
    }

    #[test]
    fn test_stats_level_and_average() {
        let stats = compute_stats(3, 2500, &[900, 951]);
        assert_eq!(stats.level, 3);
        assert_eq!(stats.experience, 2500);
        assert_eq!(stats.average_score, 926);
        assert_eq!(compute_stats(0, 0, &[]).level, 1);
    }

    #[test]
    fn test_total_words_saturates() {
        assert_eq!(sum_words([10, 20].into_iter()), 30);
        assert_eq!(sum_words([i32::MAX, i32::MAX, 5].into_iter()), i32::MAX);
    }

    #[tokio::test]
    async fn test_update_other_profile_is_forbidden() {
        let stores = Stores::in_memory();
        let err = service(&stores)
            .update("a", "b", UpdateProfileInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_create_binds_to_session_user_once() {
        let stores = Stores::in_memory();
        let user = stores
            .users
            .create_user(NewUser {
                username: "writer".into(),
                password_hash: "h".into(),
            })
            .await
            .unwrap();
        let profiles = service(&stores);

        let input = || CreateProfileInput {
            display_name: "Writer".into(),
            bio: Some("<i>hi</i>".into()),
            avatar: None,
        };
        let profile = profiles.create(&user.id, input()).await.unwrap();
        assert_eq!(profile.user_id, user.id);
        assert_eq!(profile.username, "writer");
        assert_eq!(profile.bio.as_deref(), Some("hi"));

        let err = profiles.create(&user.id, input()).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }
}
