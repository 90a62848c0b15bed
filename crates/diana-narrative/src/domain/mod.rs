//! Commands, outcomes and gating rules of the progression engine.

pub mod commands;
pub mod outcome;
pub mod requirements;
