//! Append-only record of the choices users make.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{ChoiceId, ClueId, FragmentId, UserId};

/// One row per choice made. Written once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDecisionLog {
    /// Time-ordered identifier (UUID v7).
    pub decision_id: Uuid,
    /// Who decided.
    pub user_id: UserId,
    /// Fragment the choice was made on.
    pub fragment_id: FragmentId,
    /// Stable id of the selected choice.
    pub choice_id: ChoiceId,
    /// Position of the choice when it was selected.
    pub choice_index: usize,
    /// Display text snapshot.
    pub choice_text: String,
    /// Reward amount attached to the choice.
    pub reward_amount: i64,
    /// Clues the choice unlocks.
    pub clues_unlocked: Vec<ClueId>,
    /// Command that produced this record.
    pub correlation_id: Uuid,
    /// When the choice was made.
    pub made_at: DateTime<Utc>,
}
