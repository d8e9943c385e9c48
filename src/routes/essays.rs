/**
 * Essay Routes
 * Essay CRUD, likes, reader corrections and AI analysis triggers
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{Essay, EssayFilter, PeerReview, UserCorrection};
use crate::error::{AppError, AppResult, ValidatedJson};
use crate::services::essay::{CreateEssayInput, UpdateEssayInput};
use crate::services::review::BatchStats;
use crate::services::user_correction::UserCorrectionInput;
use crate::session::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayListQuery {
    pub is_public: Option<String>,
    pub author_id: Option<String>,
}

/// Anything other than "true"/"false" means no visibility filter.
fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeCount {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub message: String,
    #[serde(flatten)]
    pub stats: BatchStats,
}

/// GET /api/essays
pub async fn list_essays(
    State(state): State<AppState>,
    Query(query): Query<EssayListQuery>,
) -> AppResult<Json<Vec<Essay>>> {
    let filter = EssayFilter {
        is_public: parse_flag(query.is_public.as_deref()),
        author_id: query.author_id.filter(|a| !a.is_empty()),
    };
    Ok(Json(state.essays.list(filter).await?))
}

/// GET /api/essays/{id}
pub async fn get_essay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Essay>> {
    Ok(Json(state.essays.get(&id).await?))
}

/// POST /api/essays
pub async fn create_essay(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateEssayInput>,
) -> AppResult<impl IntoResponse> {
    let essay = state.essays.create(&auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(essay)))
}

/// PUT /api/essays/{id}
pub async fn update_essay(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateEssayInput>,
) -> AppResult<Json<Essay>> {
    Ok(Json(state.essays.update(&id, &auth.user_id, input).await?))
}

/// DELETE /api/essays/{id}
pub async fn delete_essay(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.essays.delete(&id, &auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/essays/{id}/analyze
pub async fn analyze_essay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PeerReview>> {
    state
        .reviews
        .analyze_essay(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Essay not found".to_string()))
}

/// POST /api/essays/batch-analyze
pub async fn batch_analyze(State(state): State<AppState>) -> AppResult<Json<BatchResponse>> {
    let stats = state.reviews.batch_analyze().await?;
    Ok(Json(BatchResponse {
        message: "Batch analysis complete".to_string(),
        stats,
    }))
}

/// GET /api/essays/{id}/user-corrections
pub async fn list_user_corrections(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<UserCorrection>>> {
    Ok(Json(state.corrections.list(&id).await?))
}

/// POST /api/essays/{id}/user-corrections
pub async fn create_user_correction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UserCorrectionInput>,
) -> AppResult<impl IntoResponse> {
    let correction = state.corrections.create(&id, &auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(correction)))
}

/// POST /api/user-corrections/{id}/like
pub async fn like_user_correction(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserCorrection>> {
    Ok(Json(state.corrections.like(&id).await?))
}

/// POST /api/essays/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<LikeState>> {
    let liked = state.likes.toggle(&id, &auth.user_id).await?;
    Ok(Json(LikeState { liked }))
}

/// GET /api/essays/{id}/likes
pub async fn like_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LikeCount>> {
    Ok(Json(LikeCount {
        count: state.likes.count(&id).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(Some("true")), Some(true));
        assert_eq!(parse_flag(Some("false")), Some(false));
        assert_eq!(parse_flag(Some("yes")), None);
        assert_eq!(parse_flag(None), None);
    }

    #[test]
    fn test_batch_response_is_flat() {
        let body = serde_json::to_value(BatchResponse {
            message: "Batch analysis complete".into(),
            stats: BatchStats {
                total: 3,
                success: 1,
                failed: 0,
                skipped: 2,
            },
        })
        .unwrap();
        assert_eq!(body["total"], 3);
        assert_eq!(body["skipped"], 2);
        assert_eq!(body["message"], "Batch analysis complete");
    }
}
