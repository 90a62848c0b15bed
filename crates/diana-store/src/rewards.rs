//! Reward collaborators backed by the database or the log.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use diana_core::rewards::{RewardError, RewardGrant, RewardGranter};

/// Records grants in the `reward_grants` outbox table for the points service
/// to pick up. Re-recording the same decision is a no-op.
#[derive(Debug, Clone)]
pub struct PgRewardOutbox {
    pool: PgPool,
}

impl PgRewardOutbox {
    /// Creates a new `PgRewardOutbox`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardGranter for PgRewardOutbox {
    async fn grant(&self, grant: &RewardGrant) -> Result<(), RewardError> {
        sqlx::query(
            "INSERT INTO reward_grants (decision_id, user_id, fragment_id, amount) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (decision_id) DO NOTHING",
        )
        .bind(grant.decision_id)
        .bind(grant.user_id.get())
        .bind(grant.fragment_id.as_str())
        .bind(grant.amount)
        .execute(&self.pool)
        .await
        .map_err(|e| RewardError::Unavailable(e.to_string()))?;

        Ok(())
    }
}

/// Logs each grant and accepts it. For deployments without a points service.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRewardGranter;

#[async_trait]
impl RewardGranter for LoggingRewardGranter {
    async fn grant(&self, grant: &RewardGrant) -> Result<(), RewardError> {
        info!(
            user_id = %grant.user_id,
            amount = grant.amount,
            fragment_id = %grant.fragment_id,
            decision_id = %grant.decision_id,
            "reward granted"
        );
        Ok(())
    }
}
