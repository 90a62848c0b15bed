//! Per-user narrative progression state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fragment::{Choice, Fragment};
use super::ids::{ClueId, FragmentId, UserId};

/// A user's position in the fragment graph plus everything accumulated so far.
///
/// The visited, completed and unlocked sets only ever grow: no method on this
/// type removes an element from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNarrativeState {
    /// Owner of this state.
    pub user_id: UserId,
    /// Fragment the user is currently on; `None` after an end of branch.
    pub current_fragment_id: Option<FragmentId>,
    visited_fragments: BTreeSet<FragmentId>,
    completed_fragments: BTreeSet<FragmentId>,
    unlocked_clues: BTreeSet<ClueId>,
    /// When the user first entered the narrative.
    pub created_at: DateTime<Utc>,
    /// Last mutation.
    pub updated_at: DateTime<Utc>,
}

impl UserNarrativeState {
    /// Creates the initial state for a user entering at `entry`.
    #[must_use]
    pub fn new(user_id: UserId, entry: FragmentId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            current_fragment_id: Some(entry),
            visited_fragments: BTreeSet::new(),
            completed_fragments: BTreeSet::new(),
            unlocked_clues: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a state from its persisted parts.
    #[must_use]
    pub fn restore(
        user_id: UserId,
        current_fragment_id: Option<FragmentId>,
        visited_fragments: BTreeSet<FragmentId>,
        completed_fragments: BTreeSet<FragmentId>,
        unlocked_clues: BTreeSet<ClueId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            current_fragment_id,
            visited_fragments,
            completed_fragments,
            unlocked_clues,
            created_at,
            updated_at,
        }
    }

    /// Fragments the user has made a choice on.
    #[must_use]
    pub fn visited_fragments(&self) -> &BTreeSet<FragmentId> {
        &self.visited_fragments
    }

    /// Fragments the user has completed.
    #[must_use]
    pub fn completed_fragments(&self) -> &BTreeSet<FragmentId> {
        &self.completed_fragments
    }

    /// Clues the user holds.
    #[must_use]
    pub fn unlocked_clues(&self) -> &BTreeSet<ClueId> {
        &self.unlocked_clues
    }

    /// Returns `true` if the user holds `clue`.
    #[must_use]
    pub fn has_clue(&self, clue: &ClueId) -> bool {
        self.unlocked_clues.contains(clue)
    }

    /// Clues required by `fragment` that the user does not hold yet, in the
    /// fragment's declared order.
    #[must_use]
    pub fn missing_clues(&self, fragment: &Fragment) -> Vec<ClueId> {
        fragment
            .required_clues
            .iter()
            .filter(|clue| !self.has_clue(clue))
            .cloned()
            .collect()
    }

    /// Moves the pointer to `fragment_id` without recording any progress.
    pub fn point_at(&mut self, fragment_id: FragmentId, now: DateTime<Utc>) {
        self.current_fragment_id = Some(fragment_id);
        self.updated_at = now;
    }

    /// Applies the effects of selecting `choice` on `fragment_id`: advance the
    /// pointer, mark the fragment visited and completed, unlock clues.
    ///
    /// Returns the clues that were not held before.
    pub fn apply_choice(
        &mut self,
        fragment_id: &FragmentId,
        choice: &Choice,
        now: DateTime<Utc>,
    ) -> Vec<ClueId> {
        self.current_fragment_id.clone_from(&choice.next_fragment_id);
        self.visited_fragments.insert(fragment_id.clone());
        self.completed_fragments.insert(fragment_id.clone());
        let mut newly_unlocked = Vec::new();
        for clue in &choice.unlocks {
            if self.unlocked_clues.insert(clue.clone()) {
                newly_unlocked.push(clue.clone());
            }
        }
        self.updated_at = now;
        newly_unlocked
    }
}
