//! services/client/src/adapters/fixed_location.rs
//!
//! A location provider for hosts without positioning hardware: it reports
//! coordinates supplied up front, at any accuracy.

use async_trait::async_trait;
use vytal_core::ports::{Accuracy, Coordinates, LocationProvider, PortError, PortResult};

#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    coordinates: Coordinates,
}

impl FixedLocationProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self, _accuracy: Accuracy) -> PortResult<Coordinates> {
        let coordinates = self.coordinates;
        if !(-90.0..=90.0).contains(&coordinates.latitude)
            || !(-180.0..=180.0).contains(&coordinates.longitude)
        {
            return Err(PortError::Unexpected(format!(
                "coordinates out of range: {}, {}",
                coordinates.latitude, coordinates.longitude
            )));
        }
        Ok(coordinates)
    }
}
