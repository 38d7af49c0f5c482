//! services/client/src/adapters/catalog_api.rs
//!
//! The adapter for the service catalog. It implements the `CatalogService` port.

use async_trait::async_trait;
use serde::Deserialize;
use vytal_core::domain::{DetailSection, MedicalService, ServiceCategory, ServiceType};
use vytal_core::ports::{CatalogService, PortResult};

use super::http::BackendClient;

const SERVICES: &str = "/api/services";
const HEALTH: &str = "/api/health";

//=========================================================================================
// Wire Record
//=========================================================================================

/// A catalog entry as the backend sends it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceRecord {
    service_id: String,
    #[serde(default)]
    category: Option<ServiceCategory>,
    title: String,
    subtitle: Option<String>,
    short_description: Option<String>,
    full_description: Option<String>,
    price: Option<String>,
    session_info: Option<String>,
    tagline: Option<String>,
    #[serde(default)]
    bullets: Vec<String>,
    #[serde(default)]
    sections: Vec<DetailSection>,
    image_url: Option<String>,
    service_type: Option<ServiceType>,
}

impl ServiceRecord {
    fn to_domain(self) -> MedicalService {
        MedicalService {
            id: self.service_id,
            category: self.category,
            title: self.title,
            subtitle: self.subtitle,
            short_description: self.short_description,
            full_description: self.full_description,
            price: self.price,
            session_info: self.session_info,
            tagline: self.tagline,
            bullets: self.bullets,
            sections: self.sections,
            image_url: self.image_url,
            service_type: self.service_type,
        }
    }
}

#[derive(Deserialize)]
struct HealthRecord {
    ok: bool,
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[derive(Clone)]
pub struct HttpCatalogAdapter {
    client: BackendClient,
}

impl HttpCatalogAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogService for HttpCatalogAdapter {
    async fn list_services(
        &self,
        category: Option<ServiceCategory>,
    ) -> PortResult<Vec<MedicalService>> {
        let mut request = self.client.get(SERVICES);
        if let Some(category) = category {
            request = request.query(&[("category", category.as_str())]);
        }
        let records: Vec<ServiceRecord> = self.client.send_as(request, None).await?;
        Ok(records.into_iter().map(ServiceRecord::to_domain).collect())
    }

    async fn get_service(&self, id: &str) -> PortResult<MedicalService> {
        let request = self.client.get(&format!("{}/{}", SERVICES, id));
        let record: ServiceRecord = self.client.send_as(request, None).await?;
        Ok(record.to_domain())
    }

    async fn health_check(&self) -> PortResult<bool> {
        let record: HealthRecord = self.client.send_as(self.client.get(HEALTH), None).await?;
        Ok(record.ok)
    }
}
