use axum_test::TestServer;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use mealspin_api::routes::create_router;
use mealspin_api::services::providers::gemini::{HttpGenerationBackend, KeyRotationGateway};
use mealspin_api::services::providers::overpass::OverpassClient;
use mealspin_api::services::providers::unsplash::UnsplashClient;
use mealspin_api::services::randomizer::Timings;
use mealspin_api::state::AppState;

/// Real wiring minus the network: the credential pool is empty (generation
/// fails fast without an attempt), the Unsplash key is absent (lookups
/// short-circuit), and nothing in these tests hits the Overpass endpoint.
fn create_test_server() -> TestServer {
    let backend = HttpGenerationBackend::new(
        "http://127.0.0.1:0".to_string(),
        "test-model".to_string(),
    );
    let gateway = KeyRotationGateway::from_delimited(Arc::new(backend), "");

    let state = AppState::new(
        Arc::new(gateway),
        Arc::new(UnsplashClient::new(
            "http://127.0.0.1:0".to_string(),
            String::new(),
        )),
        Arc::new(OverpassClient::new("http://127.0.0.1:0".to_string())),
        Timings {
            tick_interval: Duration::from_millis(1),
            tick_budget: 1,
            reroll_delay: Duration::from_millis(1),
        },
    );

    TestServer::new(create_router(state)).unwrap()
}

async fn create_session(server: &TestServer) -> String {
    let response = server.post("/api/v1/sessions").await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_create_session_starts_undecided() {
    let server = create_test_server();

    let response = server.post("/api/v1/sessions").await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert!(body["id"].as_str().is_some());

    let state = &body["state"];
    assert!(state["meal"]["shop"].is_null());
    assert!(state["meal"]["food"]["value"].is_null());
    assert_eq!(state["selection"]["food"], true);
    assert_eq!(state["selection"]["drink"], true);
    assert_eq!(state["selection"]["dessert"], true);
    assert!(state["analysis"].is_null());
    assert_eq!(state["candidates"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_unknown_session_is_not_found() {
    let server = create_test_server();
    let response = server
        .get("/api/v1/sessions/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_accepts_boundary_price_range() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .put(&format!("/api/v1/sessions/{}/profile", id))
        .json(&json!({
            "price_range": {"min": 998, "max": 999},
            "spicy": 4
        }))
        .await;

    response.assert_status_ok();
    let profile: serde_json::Value = response.json();
    assert_eq!(profile["price_range"]["min"], 998);
    assert_eq!(profile["price_range"]["max"], 999);
    assert_eq!(profile["spicy"], 4);
    // Unspecified fields take their defaults.
    assert_eq!(profile["veg"], 3);
    assert_eq!(profile["radius_km"], 1.0);
}

#[tokio::test]
async fn test_profile_rejects_inverted_price_range() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .put(&format!("/api/v1/sessions/{}/profile", id))
        .json(&json!({
            "price_range": {"min": 300, "max": 100}
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_toggle_selection_round_trips() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/selection/drink", id))
        .await;
    response.assert_status_ok();
    let selection: serde_json::Value = response.json();
    assert_eq!(selection["drink"], false);
    assert_eq!(selection["food"], true);

    let response = server
        .post(&format!("/api/v1/sessions/{}/selection/drink", id))
        .await;
    let selection: serde_json::Value = response.json();
    assert_eq!(selection["drink"], true);
}

#[tokio::test]
async fn test_ban_item_appends_to_exclusions() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/exclusions", id))
        .json(&json!({"item": "Pad Thai"}))
        .await;
    response.assert_status_ok();

    // Banning the same item twice keeps the list deduplicated.
    let response = server
        .post(&format!("/api/v1/sessions/{}/exclusions", id))
        .json(&json!({"item": "Pad Thai"}))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["exclusions"], json!(["Pad Thai"]));
}

#[tokio::test]
async fn test_ban_empty_item_is_rejected() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/exclusions", id))
        .json(&json!({"item": "   "}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_randomize_with_empty_pool_is_a_noop() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/randomize", id))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);

    // Give the background cycle time to (not) run.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = server.get(&format!("/api/v1/sessions/{}", id)).await;
    let state: serde_json::Value = response.json();
    assert!(state["meal"]["shop"].is_null());
    assert_eq!(state["spinning"]["shop"], false);
}

#[tokio::test]
async fn test_reroll_with_empty_pool_settles_nothing() {
    let server = create_test_server();
    let id = create_session(&server).await;

    // No shop settled: the reroll redirects into a full randomization,
    // which no-ops on the empty pool.
    let response = server
        .post(&format!("/api/v1/sessions/{}/reroll/food", id))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = server.get(&format!("/api/v1/sessions/{}", id)).await;
    let state: serde_json::Value = response.json();
    assert!(state["meal"]["food"]["value"].is_null());
    assert_eq!(state["spinning"]["food"], false);
}

#[tokio::test]
async fn test_analyze_undecided_meal_returns_null() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/analyze", id))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["analysis"].is_null());
}

#[tokio::test]
async fn test_favorite_from_undecided_slot_is_rejected() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/favorites", id))
        .json(&json!({"category": "food"}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_unknown_favorite_is_not_found() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .delete(&format!(
            "/api/v1/sessions/{}/favorites/00000000-0000-0000-0000-000000000000",
            id
        ))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}
