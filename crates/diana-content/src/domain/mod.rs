//! Catalog model, graph validation and commands.

pub mod catalog;
pub mod commands;
pub mod validation;
