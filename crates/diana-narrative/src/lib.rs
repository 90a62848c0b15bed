//! Diana Bot: narrative progression engine.
//!
//! Resolves a user's current fragment, applies the choices they make (state
//! advance, decision record, clue unlocks, reward request) and answers
//! clue-gating questions.

pub mod application;
pub mod domain;
