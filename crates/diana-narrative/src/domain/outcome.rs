//! Results of processing a choice.

use diana_core::model::{ClueId, Fragment, UserDecisionLog};

/// Where the user ended up after a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// The choice led to another fragment.
    Fragment(Box<Fragment>),
    /// The choice has no successor; the caller renders closing content.
    EndOfBranch,
}

/// What happened to the reward attached to a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardDelivery {
    /// The choice carries no reward.
    NotApplicable,
    /// The points collaborator accepted the grant.
    Granted {
        /// Points granted.
        amount: i64,
    },
    /// The points collaborator failed; the transition stands regardless.
    Failed {
        /// Points that were requested.
        amount: i64,
        /// Collaborator error message.
        reason: String,
    },
}

/// Everything a caller needs after a successful choice.
#[derive(Debug, Clone)]
pub struct ChoiceResolution {
    /// The committed decision record.
    pub decision: UserDecisionLog,
    /// Clues the user did not hold before this choice.
    pub newly_unlocked: Vec<ClueId>,
    /// Outcome of the reward request.
    pub reward: RewardDelivery,
    /// Next fragment or end of branch.
    pub next: NextStep,
}
