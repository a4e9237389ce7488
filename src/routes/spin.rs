use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Category, NutritionReport},
    services::randomizer::SessionView,
    state::AppState,
};

/// A single bounded retry absorbs transient empty results from Overpass
const DISCOVERY_RETRIES: u32 = 1;

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: Option<NutritionReport>,
}

/// Discovers nearby venues at the profile's radius and installs them as
/// the session's candidate pool. An empty list is a valid outcome.
pub async fn discover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DiscoverRequest>,
) -> AppResult<Json<DiscoverResponse>> {
    let randomizer = state.session(id).await?;
    let radius_meters = randomizer.profile().await.radius_meters();

    let candidates = state
        .places
        .find_nearby(request.lat, request.lon, radius_meters, DISCOVERY_RETRIES)
        .await;
    randomizer.install_candidates(candidates.clone()).await;

    Ok(Json(DiscoverResponse { candidates }))
}

/// Starts a full randomization cycle. The cycle runs in the background;
/// callers poll the session state to watch it settle.
pub async fn randomize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
    let randomizer = state.session(id).await?;

    tokio::spawn({
        let randomizer = Arc::clone(&randomizer);
        async move { randomizer.randomize_all().await }
    });

    Ok((StatusCode::ACCEPTED, Json(randomizer.snapshot().await)))
}

/// Starts a single-slot reroll (or a full cycle when no shop is settled)
pub async fn reroll(
    State(state): State<AppState>,
    Path((id, category)): Path<(Uuid, Category)>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
    let randomizer = state.session(id).await?;

    tokio::spawn({
        let randomizer = Arc::clone(&randomizer);
        async move { randomizer.reroll_slot(category).await }
    });

    Ok((StatusCode::ACCEPTED, Json(randomizer.snapshot().await)))
}

/// Analyzes the settled meal set; `null` when there is nothing to analyze
/// or the provider's reply was unusable
pub async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AnalyzeResponse>> {
    let randomizer = state.session(id).await?;
    let analysis = randomizer.analyze().await;
    Ok(Json(AnalyzeResponse { analysis }))
}
