//! Effective-fragment resolution.
//!
//! Deciding which fragment a user is on is kept separate from persisting the
//! answer: [`resolve_effective_fragment`] only reads, and the caller decides
//! with [`needs_repair`] whether the stored pointer must be written.

use diana_core::error::DomainError;
use diana_core::model::{Fragment, UserNarrativeState};
use diana_core::repository::FragmentRepository;
use tracing::debug;

/// How the effective fragment was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// The user's stored pointer resolved to an active fragment.
    Current,
    /// The pointer was unset or stale; the entry fragment was used.
    EntryFallback,
}

/// The fragment a user should be shown.
#[derive(Debug, Clone)]
pub struct EffectiveFragment {
    /// The resolved fragment.
    pub fragment: Fragment,
    /// How it was resolved.
    pub source: ResolutionSource,
}

/// Resolves the fragment a user is on without writing anything.
///
/// # Errors
///
/// Returns `DomainError::NoContentAvailable` if the pointer does not resolve
/// and there is no active fragment at all.
/// Returns `DomainError::Storage` if the fragment store fails.
pub async fn resolve_effective_fragment(
    state: Option<&UserNarrativeState>,
    fragments: &dyn FragmentRepository,
) -> Result<EffectiveFragment, DomainError> {
    if let Some(current) = state.and_then(|s| s.current_fragment_id.as_ref()) {
        if let Some(fragment) = fragments.get_fragment(current).await? {
            return Ok(EffectiveFragment {
                fragment,
                source: ResolutionSource::Current,
            });
        }
        debug!(fragment_id = %current, "stored fragment no longer resolves");
    }

    let fragment = fragments
        .get_entry_fragment()
        .await?
        .ok_or(DomainError::NoContentAvailable)?;

    Ok(EffectiveFragment {
        fragment,
        source: ResolutionSource::EntryFallback,
    })
}

/// Returns `true` if the stored state must be created or re-pointed to match
/// `effective`.
#[must_use]
pub fn needs_repair(state: Option<&UserNarrativeState>, effective: &EffectiveFragment) -> bool {
    state.is_none_or(|s| s.current_fragment_id.as_ref() != Some(&effective.fragment.id))
}

#[cfg(test)]
mod tests {
    use diana_core::model::{FragmentId, UserId};
    use diana_test_support::{FragmentBuilder, InMemoryFragmentRepository, fixed_now};

    use super::*;

    fn store() -> InMemoryFragmentRepository {
        InMemoryFragmentRepository::new(vec![
            FragmentBuilder::new("f2").created_minutes_after(5).build(),
            FragmentBuilder::new("f1").build(),
        ])
    }

    #[tokio::test]
    async fn test_missing_state_resolves_to_entry_fragment() {
        // Arrange
        let fragments = store();

        // Act
        let effective = resolve_effective_fragment(None, &fragments).await.unwrap();

        // Assert
        assert_eq!(effective.fragment.id, FragmentId::from("f1"));
        assert_eq!(effective.source, ResolutionSource::EntryFallback);
        assert!(needs_repair(None, &effective));
    }

    #[tokio::test]
    async fn test_valid_pointer_resolves_without_repair() {
        // Arrange
        let fragments = store();
        let state = UserNarrativeState::new(UserId(1), FragmentId::from("f2"), fixed_now());

        // Act
        let effective = resolve_effective_fragment(Some(&state), &fragments)
            .await
            .unwrap();

        // Assert
        assert_eq!(effective.fragment.id, FragmentId::from("f2"));
        assert_eq!(effective.source, ResolutionSource::Current);
        assert!(!needs_repair(Some(&state), &effective));
    }

    #[tokio::test]
    async fn test_stale_pointer_falls_back_and_needs_repair() {
        // Arrange
        let fragments = store();
        fragments.set_active("f2", false);
        let state = UserNarrativeState::new(UserId(1), FragmentId::from("f2"), fixed_now());

        // Act
        let effective = resolve_effective_fragment(Some(&state), &fragments)
            .await
            .unwrap();

        // Assert
        assert_eq!(effective.fragment.id, FragmentId::from("f1"));
        assert_eq!(effective.source, ResolutionSource::EntryFallback);
        assert!(needs_repair(Some(&state), &effective));
    }

    #[tokio::test]
    async fn test_no_active_fragments_is_no_content_available() {
        let fragments = InMemoryFragmentRepository::new(vec![
            FragmentBuilder::new("f1").inactive().build(),
        ]);

        let result = resolve_effective_fragment(None, &fragments).await;

        assert!(matches!(result, Err(DomainError::NoContentAvailable)));
    }
}
