//! Command handlers for the narrative progression engine.
//!
//! Each handler owns one progression transaction: load state, apply the
//! command, write, commit. Calls to collaborators that must not be rolled back
//! (the rewards service) happen only after the commit.

use diana_core::clock::Clock;
use diana_core::command::Command;
use diana_core::error::DomainError;
use diana_core::model::{Fragment, UserDecisionLog, UserNarrativeState};
use diana_core::repository::{FragmentRepository, ProgressionRepository};
use diana_core::rewards::{RewardGrant, RewardGranter};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::resolution::{needs_repair, resolve_effective_fragment};
use crate::domain::commands::{EnterNarrative, ProcessChoice};
use crate::domain::outcome::{ChoiceResolution, NextStep, RewardDelivery};

/// Handles the `EnterNarrative` command: resolves the user's effective
/// fragment, creates or repairs the stored pointer if needed, and returns the
/// fragment.
///
/// # Errors
///
/// Returns `DomainError::NoContentAvailable` if there is nothing to show.
/// Returns `DomainError::Storage` if either store fails.
#[instrument(skip_all, fields(user_id = %command.user_id, correlation_id = %command.correlation_id))]
pub async fn handle_enter_narrative(
    command: &EnterNarrative,
    clock: &dyn Clock,
    fragments: &dyn FragmentRepository,
    progression: &dyn ProgressionRepository,
) -> Result<Fragment, DomainError> {
    let mut tx = progression.begin().await?;
    let state = tx.load_state_for_update(command.user_id).await?;

    let effective = match resolve_effective_fragment(state.as_ref(), fragments).await {
        Ok(effective) => effective,
        Err(DomainError::NoContentAvailable) => {
            warn!(command_type = command.command_type(), "no active fragment to enter");
            return Err(DomainError::NoContentAvailable);
        }
        Err(other) => return Err(other),
    };

    if needs_repair(state.as_ref(), &effective) {
        let now = clock.now();
        let updated = match state {
            Some(mut existing) => {
                info!(
                    from = ?existing.current_fragment_id,
                    to = %effective.fragment.id,
                    "repointing narrative state"
                );
                existing.point_at(effective.fragment.id.clone(), now);
                existing
            }
            None => {
                info!(entry = %effective.fragment.id, "creating narrative state");
                UserNarrativeState::new(command.user_id, effective.fragment.id.clone(), now)
            }
        };
        tx.save_state(&updated).await?;
        tx.commit().await?;
    }

    Ok(effective.fragment)
}

/// Handles the `ProcessChoice` command: validates the selection, records the
/// decision and the state change in one transaction, then requests the reward
/// and resolves the next fragment.
///
/// # Errors
///
/// Returns `DomainError::FragmentNotFound` if the fragment is unknown or
/// inactive.
/// Returns `DomainError::InvalidChoice` if the selection does not exist; no
/// state is touched.
/// Returns `DomainError::DanglingReference` if the committed choice points at
/// a fragment that does not resolve.
/// Returns `DomainError::Storage` if either store fails.
#[instrument(
    skip_all,
    fields(
        user_id = %command.user_id,
        fragment_id = %command.fragment_id,
        choice = %command.choice,
        correlation_id = %command.correlation_id,
    )
)]
pub async fn handle_process_choice(
    command: &ProcessChoice,
    clock: &dyn Clock,
    fragments: &dyn FragmentRepository,
    progression: &dyn ProgressionRepository,
    rewards: &dyn RewardGranter,
) -> Result<ChoiceResolution, DomainError> {
    let fragment = fragments
        .get_fragment(&command.fragment_id)
        .await?
        .ok_or_else(|| DomainError::FragmentNotFound(command.fragment_id.clone()))?;

    let Some((choice_index, choice)) = fragment.choice(&command.choice) else {
        info!("rejecting invalid choice");
        return Err(DomainError::InvalidChoice {
            fragment_id: fragment.id.clone(),
            choice: command.choice.clone(),
            available: fragment.choices.len(),
        });
    };

    let now = clock.now();
    let decision = UserDecisionLog {
        decision_id: Uuid::now_v7(),
        user_id: command.user_id,
        fragment_id: fragment.id.clone(),
        choice_id: choice.id.clone(),
        choice_index,
        choice_text: choice.text.clone(),
        reward_amount: choice.reward,
        clues_unlocked: choice.unlocks.clone(),
        correlation_id: command.correlation_id,
        made_at: now,
    };

    let mut tx = progression.begin().await?;
    tx.append_decision(&decision).await?;
    let mut state = match tx.load_state_for_update(command.user_id).await? {
        Some(state) => state,
        None => UserNarrativeState::new(command.user_id, fragment.id.clone(), now),
    };
    if state.current_fragment_id.as_ref() != Some(&fragment.id) {
        debug!(current = ?state.current_fragment_id, "choice made off the stored pointer");
    }
    let newly_unlocked = state.apply_choice(&fragment.id, choice, now);
    tx.save_state(&state).await?;
    tx.commit().await?;

    info!(
        decision_id = %decision.decision_id,
        next = ?choice.next_fragment_id,
        unlocked = newly_unlocked.len(),
        "choice committed"
    );

    let reward = deliver_reward(rewards, &decision).await;

    let next = match &choice.next_fragment_id {
        None => NextStep::EndOfBranch,
        Some(next_id) => match fragments.get_fragment(next_id).await? {
            Some(next) => NextStep::Fragment(Box::new(next)),
            None => {
                warn!(
                    decision_id = %decision.decision_id,
                    next_fragment_id = %next_id,
                    reward = ?reward,
                    newly_unlocked = ?newly_unlocked,
                    "choice committed but points to a missing fragment"
                );
                return Err(DomainError::DanglingReference {
                    fragment_id: fragment.id.clone(),
                    choice_id: choice.id.clone(),
                    next_fragment_id: next_id.clone(),
                });
            }
        },
    };

    Ok(ChoiceResolution {
        decision,
        newly_unlocked,
        reward,
        next,
    })
}

async fn deliver_reward(rewards: &dyn RewardGranter, decision: &UserDecisionLog) -> RewardDelivery {
    if decision.reward_amount == 0 {
        return RewardDelivery::NotApplicable;
    }

    let grant = RewardGrant {
        user_id: decision.user_id,
        amount: decision.reward_amount,
        fragment_id: decision.fragment_id.clone(),
        decision_id: decision.decision_id,
    };

    match rewards.grant(&grant).await {
        Ok(()) => RewardDelivery::Granted {
            amount: grant.amount,
        },
        Err(e) => {
            warn!(
                decision_id = %decision.decision_id,
                amount = grant.amount,
                error = %e,
                "reward grant failed"
            );
            RewardDelivery::Failed {
                amount: grant.amount,
                reason: e.to_string(),
            }
        }
    }
}
