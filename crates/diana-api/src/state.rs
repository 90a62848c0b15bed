//! Shared application state.

use diana_narrative::application::engine::NarrativeEngine;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The narrative progression engine.
    pub engine: NarrativeEngine,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: NarrativeEngine) -> Self {
        Self { engine }
    }
}
