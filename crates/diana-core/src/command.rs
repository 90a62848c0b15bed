//! Command abstractions.

use uuid::Uuid;

/// Trait implemented by every state-changing request.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through logs and decision records.
    fn correlation_id(&self) -> Uuid;
}
