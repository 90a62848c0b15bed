//! Clue gating.

use diana_core::model::{ClueId, Fragment, UserNarrativeState};

/// Returns `true` if the user may reach `fragment`.
///
/// Ungated fragments are open to everyone. A user without state holds no
/// clues and therefore cannot satisfy any requirement.
#[must_use]
pub fn requirements_met(state: Option<&UserNarrativeState>, fragment: &Fragment) -> bool {
    if fragment.is_ungated() {
        return true;
    }
    state.is_some_and(|s| s.missing_clues(fragment).is_empty())
}

/// Clues the user still needs to reach `fragment`.
#[must_use]
pub fn missing_requirements(
    state: Option<&UserNarrativeState>,
    fragment: &Fragment,
) -> Vec<ClueId> {
    match state {
        Some(state) => state.missing_clues(fragment),
        None => fragment.required_clues.clone(),
    }
}
