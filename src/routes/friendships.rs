/**
 * Friendship Routes
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::db::models::{Friendship, FriendshipStatus};
use crate::error::{AppError, AppResult, ValidatedJson};
use crate::services::friendship::{FriendRequestInput, FriendshipStatusInput};
use crate::session::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FriendshipQuery {
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> AppResult<FriendshipStatus> {
    match raw {
        "pending" => Ok(FriendshipStatus::Pending),
        "accepted" => Ok(FriendshipStatus::Accepted),
        "declined" => Ok(FriendshipStatus::Declined),
        "blocked" => Ok(FriendshipStatus::Blocked),
        _ => Err(AppError::invalid_field(
            "status",
            "status must be one of pending, accepted, declined, blocked",
        )),
    }
}

/// GET /api/friendships/{user_id}
pub async fn list_friendships(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Query(query): Query<FriendshipQuery>,
) -> AppResult<Json<Vec<Friendship>>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .transpose()?;
    Ok(Json(
        state
            .friendships
            .list(&user_id, &auth.user_id, status)
            .await?,
    ))
}

/// POST /api/friendships
pub async fn create_friendship(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<FriendRequestInput>,
) -> AppResult<impl IntoResponse> {
    let friendship = state
        .friendships
        .create_request(&auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(friendship)))
}

/// PUT /api/friendships/{id}
pub async fn update_friendship(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<FriendshipStatusInput>,
) -> AppResult<Json<Friendship>> {
    Ok(Json(
        state
            .friendships
            .update_status(&id, &auth.user_id, input)
            .await?,
    ))
}
