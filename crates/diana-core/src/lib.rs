//! Diana Core: shared narrative model and abstractions.
//!
//! This crate defines the record types, error type and storage/reward seams
//! that the engine, the content tooling and the stores all depend on. It
//! contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod model;
pub mod repository;
pub mod rewards;
