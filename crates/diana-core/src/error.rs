//! Domain error types.

use thiserror::Error;

use crate::model::{ChoiceId, ChoiceRef, FragmentId, UserId};

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No active fragment exists with the given identifier.
    #[error("fragment not found: {0}")]
    FragmentNotFound(FragmentId),

    /// The user has never entered the narrative.
    #[error("narrative state not found for user {0}")]
    UserStateNotFound(UserId),

    /// The selected choice does not exist on the fragment.
    #[error("invalid choice {choice} for fragment {fragment_id} ({available} choices available)")]
    InvalidChoice {
        /// The fragment the selection was made on.
        fragment_id: FragmentId,
        /// The selection as submitted by the caller.
        choice: ChoiceRef,
        /// Number of choices the fragment offers.
        available: usize,
    },

    /// A choice points at a fragment that does not resolve.
    #[error("choice {choice_id} on fragment {fragment_id} points to missing fragment {next_fragment_id}")]
    DanglingReference {
        /// The fragment holding the broken choice.
        fragment_id: FragmentId,
        /// The broken choice.
        choice_id: ChoiceId,
        /// The unresolved target.
        next_fragment_id: FragmentId,
    },

    /// There is no active fragment to start the narrative from.
    #[error("no active narrative content available")]
    NoContentAvailable,

    /// Authored content failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The underlying record store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Returns `true` for errors caused by broken content configuration
    /// rather than by the caller or the infrastructure.
    #[must_use]
    pub fn is_content_defect(&self) -> bool {
        matches!(
            self,
            Self::DanglingReference { .. } | Self::NoContentAvailable
        )
    }
}
