//! crates/vytal_core/src/location.rs
//!
//! Turns the device position into a `Location` for the profile.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{Address, Location};
use crate::ports::{Accuracy, Coordinates, LocationProvider, PortError, ReverseGeocoder};

pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission is required.")]
    PermissionDenied,
    #[error("Could not fetch location: {0}")]
    Unavailable(String),
}

/// What the address lookup produced for a fix.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressLookup {
    Found,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub location: Location,
    pub lookup: AddressLookup,
}

impl LocationFix {
    /// Coordinates were saved but the address fields are blank.
    pub fn is_partial(&self) -> bool {
        self.lookup != AddressLookup::Found
    }
}

pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    fix_timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self::with_timeout(provider, geocoder, DEFAULT_FIX_TIMEOUT)
    }

    pub fn with_timeout(
        provider: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        fix_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            geocoder,
            fix_timeout,
        }
    }

    async fn fix(&self, accuracy: Accuracy) -> Result<Coordinates, PortError> {
        match tokio::time::timeout(self.fix_timeout, self.provider.current_position(accuracy)).await
        {
            Ok(result) => result,
            Err(_) => Err(PortError::Timeout),
        }
    }

    /// Gets a position, falling back once to coarse accuracy when the precise
    /// fix times out or is unavailable.
    pub async fn current_coordinates(&self) -> Result<Coordinates, LocationError> {
        let first = match self.fix(Accuracy::High).await {
            Ok(coordinates) => return Ok(coordinates),
            Err(e) => e,
        };

        match first {
            PortError::Timeout | PortError::Unavailable(_) => {
                debug!(error = %first, "High accuracy fix failed, retrying at coarse accuracy");
                self.fix(Accuracy::Coarse).await.map_err(|e| match e {
                    PortError::Unauthorized(_) => LocationError::PermissionDenied,
                    other => LocationError::Unavailable(other.to_string()),
                })
            }
            PortError::Unauthorized(_) => Err(LocationError::PermissionDenied),
            other => Err(LocationError::Unavailable(other.to_string())),
        }
    }

    /// Resolves the current location and its address. A failed or empty lookup
    /// still returns the coordinates with blank address fields.
    pub async fn resolve(&self) -> Result<LocationFix, LocationError> {
        let coordinates = self.current_coordinates().await?;

        let (address, lookup) = match self.geocoder.reverse(coordinates).await {
            Ok(Some(address)) if address != Address::default() => (address, AddressLookup::Found),
            Ok(_) => {
                info!("Location fetched, but address not found");
                (Address::default(), AddressLookup::NotFound)
            }
            Err(e) => {
                warn!(error = %e, "Address lookup failed");
                (Address::default(), AddressLookup::Failed(e.to_string()))
            }
        };

        Ok(LocationFix {
            location: Location {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
                address,
            },
            lookup,
        })
    }
}
