//! `NarrativeEngine` facade over the command and query handlers.
//!
//! The bot front-end and the HTTP layer both talk to the engine through this
//! type; it owns the shared collaborators and stamps a correlation id on every
//! command it issues.

use std::fmt;
use std::sync::Arc;

use diana_core::clock::Clock;
use diana_core::error::DomainError;
use diana_core::model::{ChoiceRef, Fragment, FragmentId, UserId};
use diana_core::repository::{FragmentRepository, ProgressionRepository};
use diana_core::rewards::RewardGranter;
use uuid::Uuid;

use crate::application::{command_handlers, query_handlers};
use crate::application::query_handlers::{DecisionView, NarrativeProgressView, RequirementsView};
use crate::domain::commands::{EnterNarrative, ProcessChoice};
use crate::domain::outcome::ChoiceResolution;

/// The narrative progression engine.
#[derive(Clone)]
pub struct NarrativeEngine {
    clock: Arc<dyn Clock>,
    fragments: Arc<dyn FragmentRepository>,
    progression: Arc<dyn ProgressionRepository>,
    rewards: Arc<dyn RewardGranter>,
}

impl fmt::Debug for NarrativeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrativeEngine").finish_non_exhaustive()
    }
}

impl NarrativeEngine {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        fragments: Arc<dyn FragmentRepository>,
        progression: Arc<dyn ProgressionRepository>,
        rewards: Arc<dyn RewardGranter>,
    ) -> Self {
        Self {
            clock,
            fragments,
            progression,
            rewards,
        }
    }

    /// The fragment store this engine reads from.
    #[must_use]
    pub fn fragments(&self) -> &dyn FragmentRepository {
        self.fragments.as_ref()
    }

    /// Returns the fragment the user should see, creating or repairing the
    /// stored pointer as needed.
    ///
    /// # Errors
    ///
    /// See [`command_handlers::handle_enter_narrative`].
    pub async fn get_current_fragment(&self, user_id: UserId) -> Result<Fragment, DomainError> {
        let command = EnterNarrative {
            correlation_id: Uuid::new_v4(),
            user_id,
        };
        command_handlers::handle_enter_narrative(
            &command,
            self.clock.as_ref(),
            self.fragments.as_ref(),
            self.progression.as_ref(),
        )
        .await
    }

    /// Applies the user's selection on `fragment_id`.
    ///
    /// # Errors
    ///
    /// See [`command_handlers::handle_process_choice`].
    pub async fn process_choice(
        &self,
        user_id: UserId,
        fragment_id: FragmentId,
        choice: ChoiceRef,
    ) -> Result<ChoiceResolution, DomainError> {
        let command = ProcessChoice {
            correlation_id: Uuid::new_v4(),
            user_id,
            fragment_id,
            choice,
        };
        command_handlers::handle_process_choice(
            &command,
            self.clock.as_ref(),
            self.fragments.as_ref(),
            self.progression.as_ref(),
            self.rewards.as_ref(),
        )
        .await
    }

    /// Returns `true` if the user holds every clue `fragment` requires.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` if the progression store fails.
    pub async fn check_requirements(
        &self,
        user_id: UserId,
        fragment: &Fragment,
    ) -> Result<bool, DomainError> {
        query_handlers::check_requirements(user_id, fragment, self.progression.as_ref()).await
    }

    /// Reports whether the user may reach `fragment_id` and which clues are
    /// missing.
    ///
    /// # Errors
    ///
    /// See [`query_handlers::get_requirements`].
    pub async fn requirements(
        &self,
        user_id: UserId,
        fragment_id: &FragmentId,
    ) -> Result<RequirementsView, DomainError> {
        query_handlers::get_requirements(
            user_id,
            fragment_id,
            self.fragments.as_ref(),
            self.progression.as_ref(),
        )
        .await
    }

    /// Returns the user's progression summary.
    ///
    /// # Errors
    ///
    /// See [`query_handlers::get_progress`].
    pub async fn progress(&self, user_id: UserId) -> Result<NarrativeProgressView, DomainError> {
        query_handlers::get_progress(user_id, self.fragments.as_ref(), self.progression.as_ref())
            .await
    }

    /// Returns the user's most recent decisions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` if the progression store fails.
    pub async fn decision_history(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<DecisionView>, DomainError> {
        query_handlers::get_decision_history(user_id, limit, self.progression.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use diana_core::model::{ChoiceId, ChoiceRef, ClueId, FragmentId, UserId};
    use diana_test_support::{
        ChoiceBuilder, FixedClock, FragmentBuilder, InMemoryFragmentRepository,
        InMemoryProgressionRepository, RecordingRewardGranter, fixed_now,
    };

    use super::NarrativeEngine;
    use crate::domain::outcome::NextStep;

    fn engine(progression: InMemoryProgressionRepository) -> NarrativeEngine {
        let fragments = InMemoryFragmentRepository::new(vec![
            FragmentBuilder::new("f1")
                .choice(
                    ChoiceBuilder::new("enter", "Enter")
                        .reward(10)
                        .next("f2")
                        .unlocks("clue_a")
                        .build(),
                )
                .build(),
            FragmentBuilder::new("f2")
                .created_minutes_after(1)
                .choice(ChoiceBuilder::new("finish", "Finish").build())
                .build(),
            FragmentBuilder::new("f3")
                .created_minutes_after(2)
                .requires("clue_a")
                .build(),
        ]);
        NarrativeEngine::new(
            Arc::new(FixedClock(fixed_now())),
            Arc::new(fragments),
            Arc::new(progression),
            Arc::new(RecordingRewardGranter::new()),
        )
    }

    #[tokio::test]
    async fn test_full_walk_through_the_story() {
        // Arrange
        let progression = InMemoryProgressionRepository::new();
        let engine = engine(progression.clone());
        let user = UserId(1);

        // Act
        let first = engine.get_current_fragment(user).await.unwrap();
        let gate_before = engine
            .requirements(user, &FragmentId::from("f3"))
            .await
            .unwrap();
        let step = engine
            .process_choice(user, first.id.clone(), ChoiceRef::Id(ChoiceId::from("enter")))
            .await
            .unwrap();
        let gate_after = engine
            .requirements(user, &FragmentId::from("f3"))
            .await
            .unwrap();
        let last = engine
            .process_choice(user, FragmentId::from("f2"), ChoiceRef::Index(0))
            .await
            .unwrap();
        let progress = engine.progress(user).await.unwrap();
        let history = engine.decision_history(user, 10).await.unwrap();

        // Assert
        assert_eq!(first.id, FragmentId::from("f1"));
        assert_eq!(gate_before.missing, vec![ClueId::from("clue_a")]);
        assert!(matches!(step.next, NextStep::Fragment(ref f) if f.id == FragmentId::from("f2")));
        assert!(gate_after.met);
        assert_eq!(last.next, NextStep::EndOfBranch);
        assert_eq!(progress.completed_fragments.len(), 2);
        assert_eq!(progress.current_fragment_id, None);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].fragment_id, FragmentId::from("f2"));
        assert_eq!(progression.commit_count(), 3);
    }
}
