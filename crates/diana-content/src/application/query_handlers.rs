//! Query handlers for catalog inspection.

use diana_core::error::DomainError;
use serde::Serialize;

use crate::domain::catalog::Catalog;
use crate::domain::validation::{ValidationReport, validate_catalog};

/// Read-only result of checking a catalog without publishing it.
#[derive(Debug, Serialize)]
pub struct CatalogCheckView {
    /// Content fingerprint.
    pub fingerprint: String,
    /// Number of fragments in the catalog.
    pub fragment_count: usize,
    /// `true` if the catalog has no blocking findings.
    pub publishable: bool,
    /// Findings.
    pub report: ValidationReport,
}

/// Validates a catalog and computes its fingerprint.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the catalog cannot be fingerprinted.
pub fn check_catalog(catalog: &Catalog) -> Result<CatalogCheckView, DomainError> {
    let fingerprint = catalog
        .fingerprint()
        .map_err(|e| DomainError::Validation(e.to_string()))?;
    let report = validate_catalog(catalog);
    Ok(CatalogCheckView {
        fingerprint,
        fragment_count: catalog.fragments.len(),
        publishable: report.is_publishable(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_catalog_reports_blocking_findings() {
        let catalog = Catalog::from_json_str(
            r#"{"fragments":[{"id":"f1","title":"A","choices":[{"id":"go","text":"Go","next":"f9"}]}]}"#,
        )
        .unwrap();

        let view = check_catalog(&catalog).unwrap();

        assert!(!view.publishable);
        assert_eq!(view.fragment_count, 1);
        assert_eq!(view.report.errors.len(), 1);
    }
}
