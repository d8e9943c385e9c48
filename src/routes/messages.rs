/**
 * Message Routes
 * Private direct messages between two users
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::db::models::UserMessage;
use crate::error::{AppResult, ValidatedJson};
use crate::services::message::SendMessageInput;
use crate::session::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub unread_only: Option<String>,
}

/// GET /api/messages/{user_id}
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> AppResult<Json<Vec<UserMessage>>> {
    let unread_only = query.unread_only.as_deref() == Some("true");
    Ok(Json(
        state
            .messages
            .list(&user_id, &auth.user_id, unread_only)
            .await?,
    ))
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<SendMessageInput>,
) -> AppResult<impl IntoResponse> {
    let message = state.messages.send(&auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PATCH /api/messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserMessage>> {
    Ok(Json(state.messages.mark_read(&id, &auth.user_id).await?))
}
