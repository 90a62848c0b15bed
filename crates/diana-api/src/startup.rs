//! Startup tasks run by the server binary before it accepts requests.

use std::path::Path;

use diana_content::application::command_handlers::{PublishResult, handle_publish_catalog};
use diana_content::domain::catalog::Catalog;
use diana_content::domain::commands::PublishCatalog;
use diana_core::clock::Clock;
use diana_core::repository::FragmentRepository;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

/// Reads the catalog at `path` and publishes it into `fragments`.
///
/// # Errors
///
/// Returns `AppError::Catalog` if the file cannot be read or parsed, and
/// `AppError::Publish` if validation fails or the store rejects the write.
pub async fn publish_catalog_file(
    path: &Path,
    clock: &dyn Clock,
    fragments: &dyn FragmentRepository,
) -> Result<PublishResult, AppError> {
    info!(path = %path.display(), "publishing catalog");
    let command = PublishCatalog {
        correlation_id: Uuid::new_v4(),
        catalog: Catalog::load(path)?,
    };
    Ok(handle_publish_catalog(&command, clock, fragments).await?)
}
