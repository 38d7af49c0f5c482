//! crates/vytal_core/src/catalog.rs
//!
//! Lookups against the service catalog.

use tracing::debug;

use crate::domain::MedicalService;
use crate::ports::CatalogService;

/// Fetches one service, treating any failure as "not found".
pub async fn find_service(catalog: &dyn CatalogService, id: &str) -> Option<MedicalService> {
    match catalog.get_service(id).await {
        Ok(service) => Some(service),
        Err(e) => {
            debug!(service_id = id, error = %e, "Service lookup failed");
            None
        }
    }
}
