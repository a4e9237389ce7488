use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{middleware::request_id::request_id_middleware, state::AppState};

pub mod favorites;
pub mod sessions;
pub mod spin;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Session lifecycle and inputs
        .route("/sessions", post(sessions::create))
        .route("/sessions/:id", get(sessions::get))
        .route("/sessions/:id/profile", put(sessions::set_profile))
        .route(
            "/sessions/:id/selection/:category",
            post(sessions::toggle_selection),
        )
        .route("/sessions/:id/exclusions", post(sessions::ban_item))
        // Discovery and the randomization cycle
        .route("/sessions/:id/discover", post(spin::discover))
        .route("/sessions/:id/randomize", post(spin::randomize))
        .route("/sessions/:id/reroll/:category", post(spin::reroll))
        .route("/sessions/:id/analyze", post(spin::analyze))
        // Favorites
        .route("/sessions/:id/favorites", post(favorites::add))
        .route(
            "/sessions/:id/favorites/:favorite_id",
            delete(favorites::remove),
        )
        .route(
            "/sessions/:id/favorites/:favorite_id",
            put(favorites::review),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
