use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Category, CategorySelection, UserProfile},
    services::randomizer::SessionView,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub id: Uuid,
    pub state: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct BanItemRequest {
    pub item: String,
}

#[derive(Debug, Serialize)]
pub struct ExclusionsResponse {
    pub exclusions: Vec<String>,
}

/// Opens a fresh session with default profile and selection
pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<CreatedSession>) {
    let (id, randomizer) = state.create_session().await;
    let view = randomizer.snapshot().await;
    (StatusCode::CREATED, Json(CreatedSession { id, state: view }))
}

/// Observable session state: meal set, spinning flags, analysis, profile
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let randomizer = state.session(id).await?;
    Ok(Json(randomizer.snapshot().await))
}

/// Replaces the preference profile; values are clamped and an inverted
/// budget range is rejected
pub async fn set_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(profile): Json<UserProfile>,
) -> AppResult<Json<UserProfile>> {
    let randomizer = state.session(id).await?;
    let stored = randomizer.set_profile(profile).await?;
    Ok(Json(stored))
}

/// Toggles one category in the randomization selection
pub async fn toggle_selection(
    State(state): State<AppState>,
    Path((id, category)): Path<(Uuid, Category)>,
) -> AppResult<Json<CategorySelection>> {
    let randomizer = state.session(id).await?;
    Ok(Json(randomizer.toggle_category(category).await))
}

/// Bans an item name from future suggestions
pub async fn ban_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BanItemRequest>,
) -> AppResult<Json<ExclusionsResponse>> {
    let randomizer = state.session(id).await?;
    let exclusions = randomizer.ban_item(request.item).await?;
    Ok(Json(ExclusionsResponse { exclusions }))
}
