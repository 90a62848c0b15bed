//! Query handlers for the narrative progression engine.
//!
//! Queries never write. They read committed progression records and return
//! read-only view DTOs.

use chrono::{DateTime, Utc};
use diana_core::error::DomainError;
use diana_core::model::{
    ChoiceId, ClueId, Fragment, FragmentId, UserDecisionLog, UserId, UserNarrativeState,
};
use diana_core::repository::{FragmentRepository, ProgressionRepository};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::requirements;

/// Upper bound on the number of decisions a single history query returns.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Whether a user may reach a fragment, and what is missing if not.
#[derive(Debug, Serialize)]
pub struct RequirementsView {
    /// The fragment that was checked.
    pub fragment_id: FragmentId,
    /// `true` if every required clue is held.
    pub met: bool,
    /// Required clues the user does not hold, in declared order.
    pub missing: Vec<ClueId>,
}

/// Read-only view of a user's progression.
#[derive(Debug, Serialize)]
pub struct NarrativeProgressView {
    /// The user.
    pub user_id: UserId,
    /// Stored pointer; may be stale until the next `get_current_fragment`.
    pub current_fragment_id: Option<FragmentId>,
    /// Fragments the user has made a choice on.
    pub visited_fragments: Vec<FragmentId>,
    /// Fragments the user has completed.
    pub completed_fragments: Vec<FragmentId>,
    /// Clues the user holds.
    pub unlocked_clues: Vec<ClueId>,
    /// Completed fragments as a share of the active catalog, 0 to 100.
    pub progress_percentage: f64,
    /// When the user first entered.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of one decision record.
#[derive(Debug, Serialize)]
pub struct DecisionView {
    /// Decision identifier.
    pub decision_id: Uuid,
    /// Fragment the choice was made on.
    pub fragment_id: FragmentId,
    /// Stable id of the selected choice.
    pub choice_id: ChoiceId,
    /// Position of the selected choice.
    pub choice_index: usize,
    /// Text of the selected choice.
    pub choice_text: String,
    /// Reward attached to the choice.
    pub reward_amount: i64,
    /// Clues the choice unlocks.
    pub clues_unlocked: Vec<ClueId>,
    /// When the choice was made.
    pub made_at: DateTime<Utc>,
}

impl From<UserDecisionLog> for DecisionView {
    fn from(log: UserDecisionLog) -> Self {
        Self {
            decision_id: log.decision_id,
            fragment_id: log.fragment_id,
            choice_id: log.choice_id,
            choice_index: log.choice_index,
            choice_text: log.choice_text,
            reward_amount: log.reward_amount,
            clues_unlocked: log.clues_unlocked,
            made_at: log.made_at,
        }
    }
}

/// Returns `true` if the user holds every clue `fragment` requires.
///
/// A user without stored state holds no clues.
///
/// # Errors
///
/// Returns `DomainError::Storage` if the progression store fails.
pub async fn check_requirements(
    user_id: UserId,
    fragment: &Fragment,
    progression: &dyn ProgressionRepository,
) -> Result<bool, DomainError> {
    if fragment.is_ungated() {
        return Ok(true);
    }
    let state = progression.load_state(user_id).await?;
    Ok(requirements::requirements_met(state.as_ref(), fragment))
}

/// Loads a fragment by id and reports whether the user may reach it.
///
/// # Errors
///
/// Returns `DomainError::FragmentNotFound` if the fragment is unknown or
/// inactive.
/// Returns `DomainError::Storage` if either store fails.
pub async fn get_requirements(
    user_id: UserId,
    fragment_id: &FragmentId,
    fragments: &dyn FragmentRepository,
    progression: &dyn ProgressionRepository,
) -> Result<RequirementsView, DomainError> {
    let fragment = fragments
        .get_fragment(fragment_id)
        .await?
        .ok_or_else(|| DomainError::FragmentNotFound(fragment_id.clone()))?;
    let state = progression.load_state(user_id).await?;
    let missing = requirements::missing_requirements(state.as_ref(), &fragment);
    Ok(RequirementsView {
        fragment_id: fragment.id,
        met: missing.is_empty(),
        missing,
    })
}

/// Returns the user's stored progression with a completion percentage.
///
/// # Errors
///
/// Returns `DomainError::UserStateNotFound` if the user has never entered.
/// Returns `DomainError::Storage` if either store fails.
pub async fn get_progress(
    user_id: UserId,
    fragments: &dyn FragmentRepository,
    progression: &dyn ProgressionRepository,
) -> Result<NarrativeProgressView, DomainError> {
    let state = progression
        .load_state(user_id)
        .await?
        .ok_or(DomainError::UserStateNotFound(user_id))?;
    let active = fragments.count_active_fragments().await?;
    Ok(progress_view(&state, active))
}

/// Returns the user's most recent decisions, newest first. `limit` is clamped
/// to `1..=MAX_HISTORY_LIMIT`.
///
/// # Errors
///
/// Returns `DomainError::Storage` if the progression store fails.
pub async fn get_decision_history(
    user_id: UserId,
    limit: usize,
    progression: &dyn ProgressionRepository,
) -> Result<Vec<DecisionView>, DomainError> {
    let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
    let decisions = progression.load_decisions(user_id, limit).await?;
    Ok(decisions.into_iter().map(DecisionView::from).collect())
}

#[allow(clippy::cast_precision_loss)]
fn progress_view(state: &UserNarrativeState, active_fragments: u64) -> NarrativeProgressView {
    let completed = state.completed_fragments().len() as f64;
    let progress_percentage = if active_fragments == 0 {
        0.0
    } else {
        (completed / active_fragments as f64 * 100.0).min(100.0)
    };

    NarrativeProgressView {
        user_id: state.user_id,
        current_fragment_id: state.current_fragment_id.clone(),
        visited_fragments: state.visited_fragments().iter().cloned().collect(),
        completed_fragments: state.completed_fragments().iter().cloned().collect(),
        unlocked_clues: state.unlocked_clues().iter().cloned().collect(),
        progress_percentage,
        created_at: state.created_at,
        updated_at: state.updated_at,
    }
}
