//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Synthetic reviewer id owning the automated review of an essay.
pub const AI_REVIEWER_ID: &str = "AI";

/// User model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// Public profile, one per user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub total_essays: i32,
    pub total_words: i32,
    pub average_score: i32,
    pub streak: i32,
    pub level: i32,
    pub experience: i32,
    pub joined_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Derived writing statistics stored on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub total_essays: i32,
    pub total_words: i32,
    pub average_score: i32,
    pub level: i32,
    pub experience: i32,
}

/// Essay model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Essay {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub word_count: i32,
    pub is_public: bool,
    pub is_analyzed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEssay {
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub word_count: i32,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EssayPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub word_count: Option<i32>,
    pub is_public: Option<bool>,
    pub is_analyzed: Option<bool>,
}

/// Optional filters for essay listings.
#[derive(Debug, Clone, Default)]
pub struct EssayFilter {
    pub is_public: Option<bool>,
    pub author_id: Option<String>,
}

/// Manual correction suggested by a reader
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCorrection {
    pub id: String,
    pub essay_id: String,
    pub user_id: String,
    pub user_name: String,
    pub original_text: String,
    pub suggested_text: String,
    pub explanation: String,
    pub start_index: i32,
    pub end_index: i32,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserCorrection {
    pub essay_id: String,
    pub user_id: String,
    pub user_name: String,
    pub original_text: String,
    pub suggested_text: String,
    pub explanation: String,
    pub start_index: i32,
    pub end_index: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayLike {
    pub id: String,
    pub essay_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Curated reading material
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspiration {
    pub id: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub category: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub difficulty: String,
    pub word_count: i32,
    pub read_time: i32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInspiration {
    pub title: String,
    pub author: String,
    pub content: String,
    pub category: String,
    pub kind: String,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub difficulty: String,
    pub word_count: i32,
    pub read_time: i32,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InspirationFilter {
    pub category: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Declined => "declined",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: String,
    pub requester_id: String,
    pub addressee_id: String,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    pub fn involves(&self, user_id: &str) -> bool {
        self.requester_id == user_id || self.addressee_id == user_id
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.requester_id == a && self.addressee_id == b)
            || (self.requester_id == b && self.addressee_id == a)
    }
}

#[derive(Debug, Clone)]
pub struct NewFriendship {
    pub requester_id: String,
    pub addressee_id: String,
}

/// Direct message; `content` holds ciphertext at rest.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub message_type: String,
    pub related_essay_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub from_user_id: String,
    pub to_user_id: String,
    pub content: String,
    pub message_type: String,
    pub related_essay_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewCategory {
    Grammar,
    Style,
    Clarity,
    Structure,
    Content,
    Research,
}

/// Span-anchored comment embedded in a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub category: ReviewCategory,
    pub selected_text: String,
    pub text_start_index: i64,
    pub text_end_index: i64,
    pub comment: String,
}

/// The six category scores plus their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewScores {
    pub grammar_score: i32,
    pub style_score: i32,
    pub clarity_score: i32,
    pub structure_score: i32,
    pub content_score: i32,
    pub research_score: i32,
    pub overall_score: i32,
}

impl Default for ReviewScores {
    fn default() -> Self {
        Self {
            grammar_score: 100,
            style_score: 100,
            clarity_score: 100,
            structure_score: 100,
            content_score: 100,
            research_score: 100,
            overall_score: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReview {
    pub id: String,
    pub essay_id: String,
    pub reviewer_id: String,
    #[serde(flatten)]
    pub scores: ReviewScores,
    pub corrections: Vec<Correction>,
    pub review_comment: Option<String>,
    pub is_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPeerReview {
    pub essay_id: String,
    pub reviewer_id: String,
    pub scores: ReviewScores,
    pub corrections: Vec<Correction>,
    pub review_comment: Option<String>,
    pub is_submitted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PeerReviewPatch {
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

impl PeerReviewPatch {
    pub fn apply(&self, review: &mut PeerReview) {
        let s = &mut review.scores;
        if let Some(v) = self.grammar_score {
            s.grammar_score = v;
        }
        if let Some(v) = self.style_score {
            s.style_score = v;
        }
        if let Some(v) = self.clarity_score {
            s.clarity_score = v;
        }
        if let Some(v) = self.structure_score {
            s.structure_score = v;
        }
        if let Some(v) = self.content_score {
            s.content_score = v;
        }
        if let Some(v) = self.research_score {
            s.research_score = v;
        }
        if let Some(v) = self.overall_score {
            s.overall_score = v;
        }
        if let Some(comment) = &self.review_comment {
            review.review_comment = Some(comment.clone());
        }
        if let Some(submitted) = self.is_submitted {
            review.is_submitted = submitted;
        }
    }
}
