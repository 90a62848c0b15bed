//! Seam to the external points collaborator.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{FragmentId, UserId};

/// A request to credit points to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardGrant {
    /// Recipient.
    pub user_id: UserId,
    /// Points to credit; never zero.
    pub amount: i64,
    /// Fragment the rewarded choice was made on.
    pub fragment_id: FragmentId,
    /// Decision that earned the reward, for idempotent processing downstream.
    pub decision_id: Uuid,
}

/// Failure reported by the rewards collaborator.
#[derive(Debug, Error)]
pub enum RewardError {
    /// The collaborator could not be reached.
    #[error("rewards service unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused the grant.
    #[error("reward rejected: {0}")]
    Rejected(String),
}

/// The points collaborator. Grants are best-effort: a failure never undoes the
/// narrative transition that earned it.
#[async_trait]
pub trait RewardGranter: Send + Sync {
    /// Requests that `grant.amount` points be credited.
    async fn grant(&self, grant: &RewardGrant) -> Result<(), RewardError>;
}
