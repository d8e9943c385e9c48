/**
 * Peer Review Routes
 * Human reviews of essays and their span-anchored corrections
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::models::{Correction, PeerReview};
use crate::error::{AppResult, ValidatedJson};
use crate::services::review::{PeerReviewInput, PeerReviewUpdate};
use crate::session::AuthUser;
use crate::state::AppState;

/// GET /api/essays/{essay_id}/peer-reviews
pub async fn list_for_essay(
    State(state): State<AppState>,
    Path(essay_id): Path<String>,
) -> AppResult<Json<Vec<PeerReview>>> {
    Ok(Json(state.reviews.list_for_essay(&essay_id).await?))
}

/// POST /api/essays/{essay_id}/peer-reviews
///
/// Returns 200 with the existing review when the caller already reviewed
/// this essay, 201 otherwise.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(essay_id): Path<String>,
    ValidatedJson(input): ValidatedJson<PeerReviewInput>,
) -> AppResult<impl IntoResponse> {
    let existed = state.reviews.find(&essay_id, &auth.user_id).await?.is_some();
    let review = state
        .reviews
        .create_peer_review(&essay_id, &auth.user_id, input)
        .await?;
    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(review)))
}

/// GET /api/peer-reviews/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PeerReview>> {
    Ok(Json(state.reviews.get(&id).await?))
}

/// PATCH /api/peer-reviews/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<PeerReviewUpdate>,
) -> AppResult<Json<PeerReview>> {
    Ok(Json(
        state.reviews.update_review(&id, &auth.user_id, update).await?,
    ))
}

/// POST /api/peer-reviews/{id}/corrections
pub async fn add_correction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(correction): ValidatedJson<Correction>,
) -> AppResult<Json<PeerReview>> {
    Ok(Json(
        state
            .reviews
            .add_correction(&id, &auth.user_id, correction)
            .await?,
    ))
}
