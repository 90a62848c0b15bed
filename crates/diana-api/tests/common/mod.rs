//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use diana_core::model::Fragment;
use diana_narrative::application::engine::NarrativeEngine;
use diana_test_support::{
    FixedClock, InMemoryFragmentRepository, InMemoryProgressionRepository,
    RecordingRewardGranter, fixed_now,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use diana_api::state::AppState;

/// Stores behind a test application, kept so tests can inspect them.
pub struct TestStores {
    pub progression: InMemoryProgressionRepository,
    pub rewards: Arc<RecordingRewardGranter>,
}

/// Build the full app router over in-memory stores holding `fragments` and a
/// fixed clock. Uses the same route structure as `main.rs`.
pub fn build_test_app(fragments: Vec<Fragment>) -> (Router, TestStores) {
    let progression = InMemoryProgressionRepository::new();
    let rewards = Arc::new(RecordingRewardGranter::new());
    let engine = NarrativeEngine::new(
        Arc::new(FixedClock(fixed_now())),
        Arc::new(InMemoryFragmentRepository::new(fragments)),
        Arc::new(progression.clone()),
        rewards.clone(),
    );

    (
        diana_api::app(AppState::new(engine)),
        TestStores {
            progression,
            rewards,
        },
    )
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
