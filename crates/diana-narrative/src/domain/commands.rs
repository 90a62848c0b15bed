//! Commands for the narrative progression engine.

use diana_core::command::Command;
use diana_core::model::{ChoiceRef, FragmentId, UserId};
use uuid::Uuid;

/// Command to resolve (and if necessary create or repair) a user's current
/// fragment.
#[derive(Debug, Clone)]
pub struct EnterNarrative {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user entering the narrative.
    pub user_id: UserId,
}

impl Command for EnterNarrative {
    fn command_type(&self) -> &'static str {
        "narrative.enter"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to apply a choice the user selected on a fragment.
#[derive(Debug, Clone)]
pub struct ProcessChoice {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user making the choice.
    pub user_id: UserId,
    /// The fragment the choice was rendered on.
    pub fragment_id: FragmentId,
    /// The selected choice.
    pub choice: ChoiceRef,
}

impl Command for ProcessChoice {
    fn command_type(&self) -> &'static str {
        "narrative.process_choice"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
