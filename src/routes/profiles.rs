/**
 * Profile Routes
 * Public profiles, self-service edits and the user directory
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::models::UserProfile;
use crate::error::{AppResult, ValidatedJson};
use crate::services::profile::{CreateProfileInput, UpdateProfileInput};
use crate::session::AuthUser;
use crate::state::AppState;

/// GET /api/profile/{user_id}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.profiles.get(&user_id).await?))
}

/// POST /api/profile
pub async fn create_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateProfileInput>,
) -> AppResult<impl IntoResponse> {
    let profile = state.profiles.create(&auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT /api/profile/{user_id}
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateProfileInput>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(
        state
            .profiles
            .update(&user_id, &auth.user_id, input)
            .await?,
    ))
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserProfile>>> {
    Ok(Json(state.profiles.list().await?))
}
