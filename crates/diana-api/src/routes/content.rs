//! Routes for catalog authoring.

use axum::{Json, Router, routing::post};
use diana_content::application::query_handlers::{self, CatalogCheckView};
use diana_content::domain::catalog::Catalog;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /validate
#[instrument(skip_all, fields(fragments = catalog.fragments.len()))]
async fn validate_catalog(
    Json(catalog): Json<Catalog>,
) -> Result<Json<CatalogCheckView>, ApiError> {
    let view = query_handlers::check_catalog(&catalog)?;
    info!(
        fingerprint = %view.fingerprint,
        errors = view.report.errors.len(),
        warnings = view.report.warnings.len(),
        "catalog checked"
    );
    Ok(Json(view))
}

/// Returns the router for catalog authoring.
pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_catalog))
}
