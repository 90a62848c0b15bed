//! Health check endpoint.
//!
//! Reports `degraded` with 503 when the fragment store is unreachable or holds
//! no active content, since no user could be served in either case.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Active fragments, absent when the store could not be reached.
    pub active_fragments: Option<u64>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let active_fragments = match state.engine.fragments().count_active_fragments().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "health check could not reach the fragment store");
            None
        }
    };

    let healthy = active_fragments.is_some_and(|count| count > 0);
    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            active_fragments,
        }),
    )
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use diana_narrative::application::engine::NarrativeEngine;
    use diana_test_support::{
        FailingFragmentRepository, FixedClock, InMemoryProgressionRepository,
        RecordingRewardGranter, fixed_now,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn get_health(state: AppState) -> (StatusCode, serde_json::Value) {
        let app = router().with_state(state);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_is_degraded_without_content() {
        let (status, json) = get_health(crate::test_state()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["active_fragments"], 0);
    }

    #[tokio::test]
    async fn test_health_is_degraded_when_store_unreachable() {
        let state = AppState::new(NarrativeEngine::new(
            Arc::new(FixedClock(fixed_now())),
            Arc::new(FailingFragmentRepository),
            Arc::new(InMemoryProgressionRepository::new()),
            Arc::new(RecordingRewardGranter::new()),
        ));

        let (status, json) = get_health(state).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["active_fragments"].is_null());
    }
}
