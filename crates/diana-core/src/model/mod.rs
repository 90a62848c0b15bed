//! Narrative record types.

mod decision;
mod fragment;
mod ids;
mod progression;

pub use decision::UserDecisionLog;
pub use fragment::{Choice, ChoiceRef, Fragment, FragmentKind};
pub use ids::{ChoiceId, ClueId, FragmentId, UserId};
pub use progression::UserNarrativeState;
