//! Commands for catalog publishing.

use diana_core::command::Command;
use uuid::Uuid;

use super::catalog::Catalog;

/// Command to validate a catalog and upsert its fragments into the store.
#[derive(Debug, Clone)]
pub struct PublishCatalog {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The catalog to publish.
    pub catalog: Catalog,
}

impl Command for PublishCatalog {
    fn command_type(&self) -> &'static str {
        "content.publish_catalog"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
