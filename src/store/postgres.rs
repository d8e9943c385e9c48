//! Postgres-backed stores.
//!
//! Uniqueness lives in the schema (see `db::run_migrations`); unique
//! violations surface as `StoreError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use super::*;

const ESSAY_COLUMNS: &str = "id, title, content, author_id, author_name, word_count, is_public, is_analyzed, created_at, updated_at";
const PROFILE_COLUMNS: &str = "id, user_id, username, display_name, bio, avatar, total_essays, total_words, average_score, streak, level, experience, joined_at, last_active_at";
const CORRECTION_COLUMNS: &str = "id, essay_id, user_id, user_name, original_text, suggested_text, explanation, start_index, end_index, likes, created_at";
const INSPIRATION_COLUMNS: &str = "id, title, author, content, category, type, source, tags, difficulty, word_count, read_time, is_public, created_at, updated_at";
const FRIENDSHIP_COLUMNS: &str = "id, requester_id, addressee_id, status, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, from_user_id, to_user_id, content, type, related_essay_id, is_read, created_at";
const REVIEW_COLUMNS: &str = "id, essay_id, reviewer_id, grammar_score, style_score, clarity_score, structure_score, content_score, research_score, overall_score, corrections, review_comment, is_submitted, created_at, updated_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation to `Conflict`, pass anything else through.
fn conflict_or(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, now())
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(new_id())
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "Username already taken"))
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles ORDER BY total_essays DESC, joined_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO user_profiles (id, user_id, username, display_name, bio, avatar, joined_at, last_active_at)
            VALUES ($1, $2, $3, $4, $5, $6, now(), now())
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&profile.user_id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.bio)
        .bind(&profile.avatar)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "Profile already exists"))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> StoreResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles
            SET display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                avatar = COALESCE($4, avatar),
                last_active_at = now()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&patch.display_name)
        .bind(&patch.bio)
        .bind(&patch.avatar)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn update_stats(
        &self,
        user_id: &str,
        stats: ProfileStats,
    ) -> StoreResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles
            SET total_essays = $2, total_words = $3, average_score = $4,
                level = $5, experience = $6, last_active_at = now()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(stats.total_essays)
        .bind(stats.total_words)
        .bind(stats.average_score)
        .bind(stats.level)
        .bind(stats.experience)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}

#[async_trait]
impl EssayStore for PgStore {
    async fn get_essay(&self, id: &str) -> StoreResult<Option<Essay>> {
        let essay = sqlx::query_as::<_, Essay>(&format!(
            "SELECT {ESSAY_COLUMNS} FROM essays WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(essay)
    }

    async fn list_essays(&self, filter: &EssayFilter) -> StoreResult<Vec<Essay>> {
        let essays = sqlx::query_as::<_, Essay>(&format!(
            r#"
            SELECT {ESSAY_COLUMNS} FROM essays
            WHERE ($1::BOOLEAN IS NULL OR is_public = $1)
              AND ($2::TEXT IS NULL OR author_id = $2)
            ORDER BY updated_at DESC
            "#
        ))
        .bind(filter.is_public)
        .bind(&filter.author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(essays)
    }

    async fn create_essay(&self, essay: NewEssay) -> StoreResult<Essay> {
        let essay = sqlx::query_as::<_, Essay>(&format!(
            r#"
            INSERT INTO essays (id, title, content, author_id, author_name, word_count, is_public, is_analyzed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, false, now(), now())
            RETURNING {ESSAY_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&essay.title)
        .bind(&essay.content)
        .bind(&essay.author_id)
        .bind(&essay.author_name)
        .bind(essay.word_count)
        .bind(essay.is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(essay)
    }

    async fn update_essay(&self, id: &str, patch: EssayPatch) -> StoreResult<Option<Essay>> {
        let essay = sqlx::query_as::<_, Essay>(&format!(
            r#"
            UPDATE essays
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                word_count = COALESCE($4, word_count),
                is_public = COALESCE($5, is_public),
                is_analyzed = COALESCE($6, is_analyzed),
                updated_at = now()
            WHERE id = $1
            RETURNING {ESSAY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(patch.word_count)
        .bind(patch.is_public)
        .bind(patch.is_analyzed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(essay)
    }

    async fn delete_essay(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM essays WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserCorrectionStore for PgStore {
    async fn list_corrections(&self, essay_id: &str) -> StoreResult<Vec<UserCorrection>> {
        let items = sqlx::query_as::<_, UserCorrection>(&format!(
            "SELECT {CORRECTION_COLUMNS} FROM user_corrections WHERE essay_id = $1 ORDER BY created_at DESC"
        ))
        .bind(essay_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn get_correction(&self, id: &str) -> StoreResult<Option<UserCorrection>> {
        let item = sqlx::query_as::<_, UserCorrection>(&format!(
            "SELECT {CORRECTION_COLUMNS} FROM user_corrections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn create_correction(
        &self,
        correction: NewUserCorrection,
    ) -> StoreResult<UserCorrection> {
        let item = sqlx::query_as::<_, UserCorrection>(&format!(
            r#"
            INSERT INTO user_corrections (id, essay_id, user_id, user_name, original_text, suggested_text, explanation, start_index, end_index, likes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, now())
            RETURNING {CORRECTION_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&correction.essay_id)
        .bind(&correction.user_id)
        .bind(&correction.user_name)
        .bind(&correction.original_text)
        .bind(&correction.suggested_text)
        .bind(&correction.explanation)
        .bind(correction.start_index)
        .bind(correction.end_index)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn increment_likes(&self, id: &str) -> StoreResult<Option<UserCorrection>> {
        let item = sqlx::query_as::<_, UserCorrection>(&format!(
            "UPDATE user_corrections SET likes = likes + 1 WHERE id = $1 RETURNING {CORRECTION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }
}

#[async_trait]
impl EssayLikeStore for PgStore {
    async fn list_likes(&self, essay_id: &str) -> StoreResult<Vec<EssayLike>> {
        let likes = sqlx::query_as::<_, EssayLike>(
            "SELECT id, essay_id, user_id, created_at FROM essay_likes WHERE essay_id = $1",
        )
        .bind(essay_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(likes)
    }

    async fn is_liked(&self, essay_id: &str, user_id: &str) -> StoreResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM essay_likes WHERE essay_id = $1 AND user_id = $2)",
        )
        .bind(essay_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_like(&self, essay_id: &str, user_id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO essay_likes (id, essay_id, user_id, created_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (essay_id, user_id) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(essay_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, essay_id: &str, user_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM essay_likes WHERE essay_id = $1 AND user_id = $2")
            .bind(essay_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InspirationStore for PgStore {
    async fn list_inspirations(
        &self,
        filter: &InspirationFilter,
    ) -> StoreResult<Vec<Inspiration>> {
        let items = sqlx::query_as::<_, Inspiration>(&format!(
            r#"
            SELECT {INSPIRATION_COLUMNS} FROM inspirations
            WHERE is_public = true
              AND ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR type = $2)
            ORDER BY updated_at DESC
            "#
        ))
        .bind(&filter.category)
        .bind(&filter.kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn get_inspiration(&self, id: &str) -> StoreResult<Option<Inspiration>> {
        let item = sqlx::query_as::<_, Inspiration>(&format!(
            "SELECT {INSPIRATION_COLUMNS} FROM inspirations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn create_inspiration(&self, inspiration: NewInspiration) -> StoreResult<Inspiration> {
        let item = sqlx::query_as::<_, Inspiration>(&format!(
            r#"
            INSERT INTO inspirations (id, title, author, content, category, type, source, tags, difficulty, word_count, read_time, is_public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now())
            RETURNING {INSPIRATION_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&inspiration.title)
        .bind(&inspiration.author)
        .bind(&inspiration.content)
        .bind(&inspiration.category)
        .bind(&inspiration.kind)
        .bind(&inspiration.source)
        .bind(&inspiration.tags)
        .bind(&inspiration.difficulty)
        .bind(inspiration.word_count)
        .bind(inspiration.read_time)
        .bind(inspiration.is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn count_inspirations(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inspirations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl FriendshipStore for PgStore {
    async fn list_friendships(
        &self,
        user_id: &str,
        status: Option<FriendshipStatus>,
    ) -> StoreResult<Vec<Friendship>> {
        let items = sqlx::query_as::<_, Friendship>(&format!(
            r#"
            SELECT {FRIENDSHIP_COLUMNS} FROM friendships
            WHERE (requester_id = $1 OR addressee_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY updated_at DESC
            "#
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn get_friendship(&self, id: &str) -> StoreResult<Option<Friendship>> {
        let item = sqlx::query_as::<_, Friendship>(&format!(
            "SELECT {FRIENDSHIP_COLUMNS} FROM friendships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn find_between(&self, a: &str, b: &str) -> StoreResult<Option<Friendship>> {
        let item = sqlx::query_as::<_, Friendship>(&format!(
            r#"
            SELECT {FRIENDSHIP_COLUMNS} FROM friendships
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            LIMIT 1
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn create_friendship(&self, friendship: NewFriendship) -> StoreResult<Friendship> {
        sqlx::query_as::<_, Friendship>(&format!(
            r#"
            INSERT INTO friendships (id, requester_id, addressee_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', now(), now())
            RETURNING {FRIENDSHIP_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&friendship.requester_id)
        .bind(&friendship.addressee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "A relationship between these users already exists"))
    }

    async fn update_status(
        &self,
        id: &str,
        status: FriendshipStatus,
    ) -> StoreResult<Option<Friendship>> {
        let item = sqlx::query_as::<_, Friendship>(&format!(
            "UPDATE friendships SET status = $2, updated_at = now() WHERE id = $1 RETURNING {FRIENDSHIP_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn list_messages(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> StoreResult<Vec<UserMessage>> {
        let sql = if unread_only {
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM user_messages WHERE to_user_id = $1 AND is_read = false ORDER BY created_at DESC"
            )
        } else {
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM user_messages WHERE from_user_id = $1 OR to_user_id = $1 ORDER BY created_at DESC"
            )
        };
        let items = sqlx::query_as::<_, UserMessage>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn get_message(&self, id: &str) -> StoreResult<Option<UserMessage>> {
        let item = sqlx::query_as::<_, UserMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM user_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn create_message(&self, message: NewMessage) -> StoreResult<UserMessage> {
        let item = sqlx::query_as::<_, UserMessage>(&format!(
            r#"
            INSERT INTO user_messages (id, from_user_id, to_user_id, content, type, related_essay_id, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, false, now())
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&message.from_user_id)
        .bind(&message.to_user_id)
        .bind(&message.content)
        .bind(&message.message_type)
        .bind(&message.related_essay_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn mark_read(&self, id: &str) -> StoreResult<Option<UserMessage>> {
        let item = sqlx::query_as::<_, UserMessage>(&format!(
            "UPDATE user_messages SET is_read = true WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }
}

/// Row shape of `peer_reviews`; corrections travel as JSONB.
#[derive(FromRow)]
struct PeerReviewRow {
    id: String,
    essay_id: String,
    reviewer_id: String,
    grammar_score: i32,
    style_score: i32,
    clarity_score: i32,
    structure_score: i32,
    content_score: i32,
    research_score: i32,
    overall_score: i32,
    corrections: Json<Vec<Correction>>,
    review_comment: Option<String>,
    is_submitted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PeerReviewRow> for PeerReview {
    fn from(row: PeerReviewRow) -> Self {
        PeerReview {
            id: row.id,
            essay_id: row.essay_id,
            reviewer_id: row.reviewer_id,
            scores: ReviewScores {
                grammar_score: row.grammar_score,
                style_score: row.style_score,
                clarity_score: row.clarity_score,
                structure_score: row.structure_score,
                content_score: row.content_score,
                research_score: row.research_score,
                overall_score: row.overall_score,
            },
            corrections: row.corrections.0,
            review_comment: row.review_comment,
            is_submitted: row.is_submitted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PeerReviewStore for PgStore {
    async fn list_reviews(&self, essay_id: &str) -> StoreResult<Vec<PeerReview>> {
        let rows = sqlx::query_as::<_, PeerReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM peer_reviews WHERE essay_id = $1 ORDER BY created_at DESC"
        ))
        .bind(essay_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PeerReview::from).collect())
    }

    async fn get_review(
        &self,
        essay_id: &str,
        reviewer_id: &str,
    ) -> StoreResult<Option<PeerReview>> {
        let row = sqlx::query_as::<_, PeerReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM peer_reviews WHERE essay_id = $1 AND reviewer_id = $2"
        ))
        .bind(essay_id)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PeerReview::from))
    }

    async fn get_review_by_id(&self, id: &str) -> StoreResult<Option<PeerReview>> {
        let row = sqlx::query_as::<_, PeerReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM peer_reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PeerReview::from))
    }

    async fn create_review(&self, review: NewPeerReview) -> StoreResult<PeerReview> {
        let s = review.scores;
        sqlx::query_as::<_, PeerReviewRow>(&format!(
            r#"
            INSERT INTO peer_reviews (id, essay_id, reviewer_id, grammar_score, style_score, clarity_score,
                structure_score, content_score, research_score, overall_score, corrections,
                review_comment, is_submitted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now(), now())
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&review.essay_id)
        .bind(&review.reviewer_id)
        .bind(s.grammar_score)
        .bind(s.style_score)
        .bind(s.clarity_score)
        .bind(s.structure_score)
        .bind(s.content_score)
        .bind(s.research_score)
        .bind(s.overall_score)
        .bind(Json(&review.corrections))
        .bind(&review.review_comment)
        .bind(review.is_submitted)
        .fetch_one(&self.pool)
        .await
        .map(PeerReview::from)
        .map_err(|e| conflict_or(e, "A review by this reviewer already exists for this essay"))
    }

    async fn update_review(
        &self,
        id: &str,
        patch: &PeerReviewPatch,
    ) -> StoreResult<Option<PeerReview>> {
        let row = sqlx::query_as::<_, PeerReviewRow>(&format!(
            r#"
            UPDATE peer_reviews
            SET grammar_score = COALESCE($2, grammar_score),
                style_score = COALESCE($3, style_score),
                clarity_score = COALESCE($4, clarity_score),
                structure_score = COALESCE($5, structure_score),
                content_score = COALESCE($6, content_score),
                research_score = COALESCE($7, research_score),
                overall_score = COALESCE($8, overall_score),
                review_comment = COALESCE($9, review_comment),
                is_submitted = COALESCE($10, is_submitted),
                updated_at = now()
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.grammar_score)
        .bind(patch.style_score)
        .bind(patch.clarity_score)
        .bind(patch.structure_score)
        .bind(patch.content_score)
        .bind(patch.research_score)
        .bind(patch.overall_score)
        .bind(&patch.review_comment)
        .bind(patch.is_submitted)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PeerReview::from))
    }

    async fn upsert_review(&self, review: NewPeerReview) -> StoreResult<PeerReview> {
        let s = review.scores;
        let row = sqlx::query_as::<_, PeerReviewRow>(&format!(
            r#"
            INSERT INTO peer_reviews (id, essay_id, reviewer_id, grammar_score, style_score, clarity_score,
                structure_score, content_score, research_score, overall_score, corrections,
                review_comment, is_submitted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now(), now())
            ON CONFLICT (essay_id, reviewer_id) DO UPDATE SET
                grammar_score = EXCLUDED.grammar_score,
                style_score = EXCLUDED.style_score,
                clarity_score = EXCLUDED.clarity_score,
                structure_score = EXCLUDED.structure_score,
                content_score = EXCLUDED.content_score,
                research_score = EXCLUDED.research_score,
                overall_score = EXCLUDED.overall_score,
                corrections = EXCLUDED.corrections,
                updated_at = now()
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&review.essay_id)
        .bind(&review.reviewer_id)
        .bind(s.grammar_score)
        .bind(s.style_score)
        .bind(s.clarity_score)
        .bind(s.structure_score)
        .bind(s.content_score)
        .bind(s.research_score)
        .bind(s.overall_score)
        .bind(Json(&review.corrections))
        .bind(&review.review_comment)
        .bind(review.is_submitted)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn append_correction(
        &self,
        id: &str,
        correction: Correction,
    ) -> StoreResult<Option<PeerReview>> {
        let row = sqlx::query_as::<_, PeerReviewRow>(&format!(
            r#"
            UPDATE peer_reviews
            SET corrections = corrections || jsonb_build_array($2::jsonb),
                updated_at = now()
            WHERE id = $1 AND is_submitted = false
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(&correction))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PeerReview::from))
    }
}
