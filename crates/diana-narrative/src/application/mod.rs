//! Command and query handlers plus the engine facade.

pub mod command_handlers;
pub mod engine;
pub mod query_handlers;
pub mod resolution;
