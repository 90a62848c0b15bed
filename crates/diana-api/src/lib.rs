//! Diana Bot API server library.
//!
//! Exposes the router, configuration, error types and startup helpers so the
//! binary and the integration tests build the same application.

pub mod config;
pub mod error;
pub mod routes;
pub mod startup;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/narrative", routes::narrative::router())
        .nest("/api/v1/content", routes::content::router())
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state_with(
    fragments: Vec<diana_core::model::Fragment>,
    progression: std::sync::Arc<dyn diana_core::repository::ProgressionRepository>,
    rewards: std::sync::Arc<dyn diana_core::rewards::RewardGranter>,
) -> AppState {
    use std::sync::Arc;

    use diana_narrative::application::engine::NarrativeEngine;
    use diana_test_support::{FixedClock, InMemoryFragmentRepository, fixed_now};

    AppState::new(NarrativeEngine::new(
        Arc::new(FixedClock(fixed_now())),
        Arc::new(InMemoryFragmentRepository::new(fragments)),
        progression,
        rewards,
    ))
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use std::sync::Arc;

    use diana_test_support::{InMemoryProgressionRepository, RecordingRewardGranter};

    test_state_with(
        Vec::new(),
        Arc::new(InMemoryProgressionRepository::new()),
        Arc::new(RecordingRewardGranter::new()),
    )
}
