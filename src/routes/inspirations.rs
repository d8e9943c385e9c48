/**
 * Inspiration Routes
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::db::models::{Inspiration, InspirationFilter};
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InspirationQuery {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/inspirations
pub async fn list_inspirations(
    State(state): State<AppState>,
    Query(query): Query<InspirationQuery>,
) -> AppResult<Json<Vec<Inspiration>>> {
    let filter = InspirationFilter {
        category: query.category.filter(|c| !c.is_empty()),
        kind: query.kind.filter(|k| !k.is_empty()),
    };
    Ok(Json(state.inspirations.list(filter).await?))
}

/// GET /api/inspirations/{id}
pub async fn get_inspiration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Inspiration>> {
    Ok(Json(state.inspirations.get(&id).await?))
}
