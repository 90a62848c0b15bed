//! Storage abstractions.
//!
//! Fragments are read through [`FragmentRepository`]. Progression state and
//! decision records are written only through a [`ProgressionTransaction`]
//! obtained from [`ProgressionRepository::begin`], so that a decision record
//! and the state change it describes are committed together.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::{Fragment, FragmentId, UserDecisionLog, UserId, UserNarrativeState};

/// Access to published fragments.
#[async_trait]
pub trait FragmentRepository: Send + Sync {
    /// Loads an active fragment. Inactive or unknown ids yield `None`.
    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, DomainError>;

    /// Loads the earliest-created active fragment.
    async fn get_entry_fragment(&self) -> Result<Option<Fragment>, DomainError>;

    /// Counts active fragments.
    async fn count_active_fragments(&self) -> Result<u64, DomainError>;

    /// Makes `fragments` the published set: each one is inserted or replaced,
    /// timestamps included, and every stored fragment not listed is
    /// deactivated. The earliest listed active fragment becomes the entry.
    async fn publish_fragments(&self, fragments: &[Fragment]) -> Result<(), DomainError>;
}

/// Access to per-user progression records.
#[async_trait]
pub trait ProgressionRepository: Send + Sync {
    /// Opens a transaction scoped to a single engine operation.
    async fn begin(&self) -> Result<Box<dyn ProgressionTransaction>, DomainError>;

    /// Reads a user's state outside any transaction.
    async fn load_state(&self, user_id: UserId)
    -> Result<Option<UserNarrativeState>, DomainError>;

    /// Reads a user's most recent decisions, newest first.
    async fn load_decisions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<UserDecisionLog>, DomainError>;
}

/// A unit of work over progression records.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// every write made through it.
#[async_trait]
pub trait ProgressionTransaction: Send {
    /// Reads a user's state, locking it against concurrent writers until the
    /// transaction ends.
    async fn load_state_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<UserNarrativeState>, DomainError>;

    /// Inserts or replaces a user's state.
    async fn save_state(&mut self, state: &UserNarrativeState) -> Result<(), DomainError>;

    /// Appends a decision record.
    async fn append_decision(&mut self, decision: &UserDecisionLog) -> Result<(), DomainError>;

    /// Makes every write visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}
