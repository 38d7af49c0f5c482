//! services/client/src/adapters/geocoder.rs
//!
//! Reverse geocoding through a Nominatim-compatible service. It implements
//! the `ReverseGeocoder` port.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use vytal_core::domain::Address;
use vytal_core::ports::{Coordinates, PortError, PortResult, ReverseGeocoder};

#[derive(Deserialize, Default)]
struct NominatimAddress {
    road: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

#[derive(Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

impl NominatimResponse {
    fn to_domain(self) -> Option<Address> {
        let parts = self.address?;
        Some(Address {
            street: parts.road.or(parts.suburb).unwrap_or_default(),
            landmark: parts.neighbourhood.unwrap_or_default(),
            city: parts
                .city
                .or(parts.town)
                .or(parts.village)
                .unwrap_or_default(),
            state: parts.state.unwrap_or_default(),
            pincode: parts.postcode.unwrap_or_default(),
            country: parts.country.unwrap_or_default(),
            formatted_address: self.display_name.unwrap_or_default(),
        })
    }
}

#[derive(Clone)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// `user_agent` is mandatory under the public Nominatim usage policy.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        if let Ok(value) = header::HeaderValue::from_str(user_agent) {
            headers.insert(header::USER_AGENT, value);
        }
        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> PortResult<Option<Address>> {
        let response = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("zoom", "18".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::Remote {
                status: response.status().as_u16(),
                message: None,
            });
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(body.to_domain())
    }
}
