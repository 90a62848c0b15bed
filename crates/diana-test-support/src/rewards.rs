//! Test reward collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use diana_core::rewards::{RewardError, RewardGrant, RewardGranter};

/// Records every grant and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingRewardGranter {
    grants: Mutex<Vec<RewardGrant>>,
}

impl RecordingRewardGranter {
    /// Creates a granter with no recorded grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded grants.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn grants(&self) -> Vec<RewardGrant> {
        self.grants.lock().unwrap().clone()
    }
}

#[async_trait]
impl RewardGranter for RecordingRewardGranter {
    async fn grant(&self, grant: &RewardGrant) -> Result<(), RewardError> {
        self.grants.lock().unwrap().push(grant.clone());
        Ok(())
    }
}

/// Rejects every grant as unavailable.
#[derive(Debug)]
pub struct FailingRewardGranter;

#[async_trait]
impl RewardGranter for FailingRewardGranter {
    async fn grant(&self, _grant: &RewardGrant) -> Result<(), RewardError> {
        Err(RewardError::Unavailable("points service timed out".into()))
    }
}
