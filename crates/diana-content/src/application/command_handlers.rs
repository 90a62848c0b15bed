//! Command handlers for catalog publishing.

use diana_core::clock::Clock;
use diana_core::command::Command;
use diana_core::error::DomainError;
use diana_core::repository::FragmentRepository;
use tracing::{info, instrument, warn};

use crate::domain::commands::PublishCatalog;
use crate::domain::validation::{ValidationIssue, validate_catalog};

/// Result of a successful publish.
#[derive(Debug)]
pub struct PublishResult {
    /// Fingerprint of the published catalog.
    pub fingerprint: String,
    /// Number of fragments upserted, active or not.
    pub published: usize,
    /// Non-blocking findings.
    pub warnings: Vec<ValidationIssue>,
}

/// Handles the `PublishCatalog` command: validates the catalog and, if it has
/// no errors, makes it the published set. Creation times are restamped in
/// catalog order and fragments the catalog no longer lists are deactivated,
/// so the store's entry fragment is the one validation walked from.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the catalog has blocking findings;
/// nothing is written in that case.
/// Returns `DomainError::Storage` if the fragment store fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
pub async fn handle_publish_catalog(
    command: &PublishCatalog,
    clock: &dyn Clock,
    repo: &dyn FragmentRepository,
) -> Result<PublishResult, DomainError> {
    let fingerprint = command
        .catalog
        .fingerprint()
        .map_err(|e| DomainError::Validation(e.to_string()))?;

    let report = validate_catalog(&command.catalog);
    if !report.is_publishable() {
        warn!(
            command_type = command.command_type(),
            %fingerprint,
            errors = report.errors.len(),
            "refusing to publish catalog"
        );
        return Err(DomainError::Validation(report.error_summary()));
    }
    for warning in &report.warnings {
        warn!(%fingerprint, "{warning}");
    }

    let fragments = command.catalog.to_fragments(clock.now());
    repo.publish_fragments(&fragments).await?;

    info!(%fingerprint, fragments = fragments.len(), "catalog published");
    Ok(PublishResult {
        fingerprint,
        published: fragments.len(),
        warnings: report.warnings,
    })
}
