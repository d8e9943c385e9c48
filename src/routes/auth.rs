/**
 * Authentication Routes
 * Cookie-session signup, login, logout and current-user lookup
 */
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::{AppError, AppResult, ValidatedJson};
use crate::services::auth::{LoginInput, RegisterInput};
use crate::session::{clear_cookie, session_cookie, token_from_headers, AuthUser};
use crate::state::AppState;

/// Identity returned by every auth endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn start_session(state: &AppState, user: User) -> impl IntoResponse {
    let token = state.sessions.create(&user.id).await;
    let cookie = session_cookie(
        &state.config.session_cookie_name,
        &token,
        state.sessions.ttl(),
        state.config.is_production(),
    );
    ([(header::SET_COOKIE, cookie)], Json(UserInfo::from(user)))
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, start_session(&state, user).await))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth.login(input).await?;
    Ok(start_session(&state, user).await)
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers, &state.config.session_cookie_name) {
        state.sessions.destroy(&token).await;
    }
    let cookie = clear_cookie(
        &state.config.session_cookie_name,
        state.config.is_production(),
    );
    (
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<UserInfo>> {
    match state.auth.current_user(&auth.user_id).await? {
        Some(user) => Ok(Json(user.into())),
        None => {
            // the account disappeared while the session was live
            state.sessions.destroy(&auth.token).await;
            Err(AppError::NotFound("User not found".to_string()))
        }
    }
}
