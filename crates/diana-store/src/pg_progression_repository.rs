//! `PostgreSQL` implementation of the progression storage traits.
//!
//! Each [`PgProgressionTransaction`] wraps one database transaction. Loading a
//! user's state through it first takes a transaction-scoped advisory lock on
//! the user id, so concurrent operations for the same user run one after
//! another even before the user has a state row for `FOR UPDATE` to lock.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use diana_core::error::DomainError;
use diana_core::model::{
    ChoiceId, ClueId, FragmentId, UserDecisionLog, UserId, UserNarrativeState,
};
use diana_core::repository::{ProgressionRepository, ProgressionTransaction};

use crate::storage_error;

const STATE_COLUMNS: &str = "user_id, current_fragment_id, visited_fragments, \
     completed_fragments, unlocked_clues, created_at, updated_at";

const DECISION_COLUMNS: &str = "decision_id, user_id, fragment_id, choice_id, choice_index, \
     choice_text, reward_amount, clues_unlocked, correlation_id, made_at";

/// PostgreSQL-backed progression store.
#[derive(Debug, Clone)]
pub struct PgProgressionRepository {
    pool: PgPool,
}

impl PgProgressionRepository {
    /// Creates a new `PgProgressionRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A progression unit of work. Dropping it without committing rolls back.
pub struct PgProgressionTransaction {
    tx: Transaction<'static, Postgres>,
}

fn state_from_row(row: &PgRow) -> Result<UserNarrativeState, DomainError> {
    let user_id: i64 = row.try_get("user_id").map_err(storage_error)?;
    let current: Option<String> = row.try_get("current_fragment_id").map_err(storage_error)?;
    let Json(visited): Json<BTreeSet<FragmentId>> =
        row.try_get("visited_fragments").map_err(storage_error)?;
    let Json(completed): Json<BTreeSet<FragmentId>> =
        row.try_get("completed_fragments").map_err(storage_error)?;
    let Json(clues): Json<BTreeSet<ClueId>> =
        row.try_get("unlocked_clues").map_err(storage_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(storage_error)?;

    Ok(UserNarrativeState::restore(
        UserId(user_id),
        current.map(FragmentId::from),
        visited,
        completed,
        clues,
        created_at,
        updated_at,
    ))
}

fn decision_from_row(row: &PgRow) -> Result<UserDecisionLog, DomainError> {
    let user_id: i64 = row.try_get("user_id").map_err(storage_error)?;
    let fragment_id: String = row.try_get("fragment_id").map_err(storage_error)?;
    let choice_id: String = row.try_get("choice_id").map_err(storage_error)?;
    let choice_index: i32 = row.try_get("choice_index").map_err(storage_error)?;
    let Json(clues_unlocked): Json<Vec<ClueId>> =
        row.try_get("clues_unlocked").map_err(storage_error)?;
    let decision_id: Uuid = row.try_get("decision_id").map_err(storage_error)?;
    let correlation_id: Uuid = row.try_get("correlation_id").map_err(storage_error)?;

    Ok(UserDecisionLog {
        decision_id,
        user_id: UserId(user_id),
        fragment_id: FragmentId::from(fragment_id),
        choice_id: ChoiceId::from(choice_id),
        choice_index: usize::try_from(choice_index)
            .map_err(|e| DomainError::Storage(format!("corrupt choice_index: {e}")))?,
        choice_text: row.try_get("choice_text").map_err(storage_error)?,
        reward_amount: row.try_get("reward_amount").map_err(storage_error)?,
        clues_unlocked,
        correlation_id,
        made_at: row.try_get("made_at").map_err(storage_error)?,
    })
}

#[async_trait]
impl ProgressionRepository for PgProgressionRepository {
    async fn begin(&self) -> Result<Box<dyn ProgressionTransaction>, DomainError> {
        let tx = self.pool.begin().await.map_err(storage_error)?;
        Ok(Box::new(PgProgressionTransaction { tx }))
    }

    async fn load_state(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserNarrativeState>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {STATE_COLUMNS} FROM user_narrative_states WHERE user_id = $1"
        ))
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(state_from_row).transpose()
    }

    async fn load_decisions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<UserDecisionLog>, DomainError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {DECISION_COLUMNS} FROM user_decision_log \
             WHERE user_id = $1 \
             ORDER BY made_at DESC, decision_id DESC \
             LIMIT $2"
        ))
        .bind(user_id.get())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(decision_from_row).collect()
    }
}

#[async_trait]
impl ProgressionTransaction for PgProgressionTransaction {
    async fn load_state_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<UserNarrativeState>, DomainError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(user_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(storage_error)?;

        let row = sqlx::query(&format!(
            "SELECT {STATE_COLUMNS} FROM user_narrative_states WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(state_from_row).transpose()
    }

    async fn save_state(&mut self, state: &UserNarrativeState) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO user_narrative_states \
             (user_id, current_fragment_id, visited_fragments, completed_fragments, \
              unlocked_clues, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id) DO UPDATE SET \
             current_fragment_id = EXCLUDED.current_fragment_id, \
             visited_fragments = EXCLUDED.visited_fragments, \
             completed_fragments = EXCLUDED.completed_fragments, \
             unlocked_clues = EXCLUDED.unlocked_clues, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(state.user_id.get())
        .bind(state.current_fragment_id.as_ref().map(FragmentId::as_str))
        .bind(Json(state.visited_fragments()))
        .bind(Json(state.completed_fragments()))
        .bind(Json(state.unlocked_clues()))
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn append_decision(&mut self, decision: &UserDecisionLog) -> Result<(), DomainError> {
        let choice_index = i32::try_from(decision.choice_index)
            .map_err(|e| DomainError::Storage(format!("choice_index out of range: {e}")))?;

        sqlx::query(&format!(
            "INSERT INTO user_decision_log ({DECISION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(decision.decision_id)
        .bind(decision.user_id.get())
        .bind(decision.fragment_id.as_str())
        .bind(decision.choice_id.as_str())
        .bind(choice_index)
        .bind(&decision.choice_text)
        .bind(decision.reward_amount)
        .bind(Json(&decision.clues_unlocked))
        .bind(decision.correlation_id)
        .bind(decision.made_at)
        .execute(&mut *self.tx)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        this.tx.commit().await.map_err(storage_error)
    }
}
