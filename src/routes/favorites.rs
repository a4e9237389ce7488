use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppResult, models::Category, models::Favorite, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct ReviewFavoriteRequest {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Copies the named slot's settled item into the favorites list.
/// Pending, inapplicable and errored slots cannot be favorited.
pub async fn add(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddFavoriteRequest>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    let randomizer = state.session(id).await?;
    let favorite = randomizer.add_favorite(request.category).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((id, favorite_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let randomizer = state.session(id).await?;
    randomizer.remove_favorite(favorite_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Updates a favorite's rating and note
pub async fn review(
    State(state): State<AppState>,
    Path((id, favorite_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ReviewFavoriteRequest>,
) -> AppResult<Json<Favorite>> {
    let randomizer = state.session(id).await?;
    let favorite = randomizer
        .review_favorite(favorite_id, request.rating, request.comment)
        .await?;
    Ok(Json(favorite))
}
