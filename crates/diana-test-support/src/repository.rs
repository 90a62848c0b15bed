//! Test repositories: in-memory and failing implementations of the storage
//! traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diana_core::error::DomainError;
use diana_core::model::{Fragment, FragmentId, UserDecisionLog, UserId, UserNarrativeState};
use diana_core::repository::{FragmentRepository, ProgressionRepository, ProgressionTransaction};

/// A fragment store backed by a vector. Insertion order breaks ties between
/// fragments created at the same instant.
#[derive(Debug, Default)]
pub struct InMemoryFragmentRepository {
    fragments: Mutex<Vec<Fragment>>,
}

impl InMemoryFragmentRepository {
    /// Creates a store holding `fragments`.
    #[must_use]
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self {
            fragments: Mutex::new(fragments),
        }
    }

    /// Flips the active flag of a stored fragment.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_active(&self, id: &str, active: bool) {
        let mut fragments = self.fragments.lock().unwrap();
        for fragment in fragments.iter_mut().filter(|f| f.id.as_str() == id) {
            fragment.is_active = active;
        }
    }

    /// Returns a snapshot of every stored fragment, active or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn all(&self) -> Vec<Fragment> {
        self.fragments.lock().unwrap().clone()
    }
}

#[async_trait]
impl FragmentRepository for InMemoryFragmentRepository {
    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, DomainError> {
        Ok(self
            .fragments
            .lock()
            .unwrap()
            .iter()
            .find(|f| &f.id == id && f.is_active)
            .cloned())
    }

    async fn get_entry_fragment(&self) -> Result<Option<Fragment>, DomainError> {
        Ok(self
            .fragments
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.is_active)
            .min_by_key(|f| f.created_at)
            .cloned())
    }

    async fn count_active_fragments(&self) -> Result<u64, DomainError> {
        let fragments = self.fragments.lock().unwrap();
        Ok(fragments.iter().filter(|f| f.is_active).count() as u64)
    }

    async fn publish_fragments(&self, incoming: &[Fragment]) -> Result<(), DomainError> {
        let mut fragments = self.fragments.lock().unwrap();
        for stored in fragments.iter_mut() {
            if !incoming.iter().any(|f| f.id == stored.id) {
                stored.is_active = false;
            }
        }
        for fragment in incoming {
            match fragments.iter_mut().find(|f| f.id == fragment.id) {
                Some(existing) => *existing = fragment.clone(),
                None => fragments.push(fragment.clone()),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ProgressionRecords {
    states: HashMap<UserId, UserNarrativeState>,
    decisions: Vec<UserDecisionLog>,
}

/// A progression store that stages writes per transaction and applies them
/// under one lock on commit. Uncommitted transactions leave no trace.
///
/// Row locking is not modelled: `load_state_for_update` is a plain read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgressionRepository {
    records: Arc<Mutex<ProgressionRecords>>,
    commits: Arc<AtomicUsize>,
    fail_commits: bool,
}

impl InMemoryProgressionRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose transactions always fail to commit.
    #[must_use]
    pub fn failing_commits() -> Self {
        Self {
            fail_commits: true,
            ..Self::default()
        }
    }

    /// Seeds a committed state.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_state(self, state: UserNarrativeState) -> Self {
        self.records
            .lock()
            .unwrap()
            .states
            .insert(state.user_id, state);
        self
    }

    /// Returns the committed state of a user.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn state(&self, user_id: UserId) -> Option<UserNarrativeState> {
        self.records.lock().unwrap().states.get(&user_id).cloned()
    }

    /// Returns every committed decision, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn decisions(&self) -> Vec<UserDecisionLog> {
        self.records.lock().unwrap().decisions.clone()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProgressionRepository for InMemoryProgressionRepository {
    async fn begin(&self) -> Result<Box<dyn ProgressionTransaction>, DomainError> {
        Ok(Box::new(InMemoryTransaction {
            records: Arc::clone(&self.records),
            commits: Arc::clone(&self.commits),
            fail_commit: self.fail_commits,
            staged_states: HashMap::new(),
            staged_decisions: Vec::new(),
        }))
    }

    async fn load_state(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserNarrativeState>, DomainError> {
        Ok(self.state(user_id))
    }

    async fn load_decisions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<UserDecisionLog>, DomainError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .decisions
            .iter()
            .rev()
            .filter(|d| d.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

struct InMemoryTransaction {
    records: Arc<Mutex<ProgressionRecords>>,
    commits: Arc<AtomicUsize>,
    fail_commit: bool,
    staged_states: HashMap<UserId, UserNarrativeState>,
    staged_decisions: Vec<UserDecisionLog>,
}

#[async_trait]
impl ProgressionTransaction for InMemoryTransaction {
    async fn load_state_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<UserNarrativeState>, DomainError> {
        if let Some(staged) = self.staged_states.get(&user_id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.records.lock().unwrap().states.get(&user_id).cloned())
    }

    async fn save_state(&mut self, state: &UserNarrativeState) -> Result<(), DomainError> {
        self.staged_states.insert(state.user_id, state.clone());
        Ok(())
    }

    async fn append_decision(&mut self, decision: &UserDecisionLog) -> Result<(), DomainError> {
        self.staged_decisions.push(decision.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        if self.fail_commit {
            return Err(DomainError::Storage("commit failed".into()));
        }
        let this = *self;
        let mut records = this.records.lock().unwrap();
        records.states.extend(this.staged_states);
        records.decisions.extend(this.staged_decisions);
        this.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A fragment store whose every call fails with a storage error.
#[derive(Debug)]
pub struct FailingFragmentRepository;

#[async_trait]
impl FragmentRepository for FailingFragmentRepository {
    async fn get_fragment(&self, _id: &FragmentId) -> Result<Option<Fragment>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn get_entry_fragment(&self) -> Result<Option<Fragment>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn count_active_fragments(&self) -> Result<u64, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn publish_fragments(&self, _fragments: &[Fragment]) -> Result<(), DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}

/// A progression store whose every call fails with a storage error.
#[derive(Debug)]
pub struct FailingProgressionRepository;

#[async_trait]
impl ProgressionRepository for FailingProgressionRepository {
    async fn begin(&self) -> Result<Box<dyn ProgressionTransaction>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn load_state(
        &self,
        _user_id: UserId,
    ) -> Result<Option<UserNarrativeState>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn load_decisions(
        &self,
        _user_id: UserId,
        _limit: usize,
    ) -> Result<Vec<UserDecisionLog>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}
