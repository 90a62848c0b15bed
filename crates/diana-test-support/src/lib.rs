//! Shared test doubles and fixtures for the Diana Bot engine.

mod clock;
mod fixtures;
mod repository;
mod rewards;

pub use clock::FixedClock;
pub use fixtures::{ChoiceBuilder, FragmentBuilder, fixed_now};
pub use repository::{
    FailingFragmentRepository, FailingProgressionRepository, InMemoryFragmentRepository,
    InMemoryProgressionRepository,
};
pub use rewards::{FailingRewardGranter, RecordingRewardGranter};
