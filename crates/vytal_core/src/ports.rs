//! crates/vytal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! session and booking logic independent of the HTTP backend, the local
//! store, the payment sheet and the device's location services.

use async_trait::async_trait;

use crate::domain::{
    Address, BookingRequest, MedicalService, OrderDescriptor, OtpChallenge,
    PaymentAuthorization, ProfileUpdate, ServiceCategory, UserProfile, VerifiedLogin,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    /// The credentials were rejected, with the server's explanation if it sent one.
    #[error("Unauthorized: {}", .0.as_deref().unwrap_or("no message"))]
    Unauthorized(Option<String>),
    /// The remote service answered with a non-success status.
    #[error("Remote service returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Remote { status: u16, message: Option<String> },
    /// The local store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Operation timed out")]
    Timeout,
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The user backed out of an interactive step.
    #[error("Cancelled by user")]
    Cancelled,
}

impl PortError {
    /// The human-readable message the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            PortError::Remote {
                message: Some(message),
                ..
            }
            | PortError::Unauthorized(Some(message))
                if !message.trim().is_empty() =>
            {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

/// Starts the message of an `Unexpected` error built from a body the client
/// could not parse. Only these messages are safe to show to a user.
pub const SERVER_ERROR_PREFIX: &str = "Server error: ";

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Local Persistence
//=========================================================================================

/// Durable storage for small string values, keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;

    /// Removes every key, attempting all of them even after a failure.
    /// Returns the first error seen.
    async fn remove_many(&self, keys: &[&str]) -> PortResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.remove(key).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

//=========================================================================================
// Remote Service Ports
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn send_otp(&self, phone_number: &str) -> PortResult<OtpChallenge>;

    async fn verify_otp(&self, phone_number: &str, code: &str) -> PortResult<VerifiedLogin>;

    async fn resend_otp(&self, phone_number: &str) -> PortResult<OtpChallenge>;
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn get_profile(&self, token: &str) -> PortResult<UserProfile>;

    /// Sends the update and returns the user as the server now sees it.
    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> PortResult<UserProfile>;
}

#[async_trait]
pub trait BookingService: Send + Sync {
    /// Creates a booking. The returned record is opaque to the client.
    async fn create_booking(
        &self,
        token: &str,
        request: &BookingRequest,
    ) -> PortResult<serde_json::Value>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_order(&self, token: &str, amount: u64) -> PortResult<OrderDescriptor>;

    async fn verify_payment(&self, token: &str, authorization: &PaymentAuthorization)
        -> PortResult<()>;
}

/// The payment sheet. Collects the user's authorization for an order.
#[async_trait]
pub trait PaymentAuthorizer: Send + Sync {
    /// Returns `PortError::Cancelled` when the user dismisses the sheet.
    async fn authorize(&self, order: &OrderDescriptor) -> PortResult<PaymentAuthorization>;
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_services(
        &self,
        category: Option<ServiceCategory>,
    ) -> PortResult<Vec<MedicalService>>;

    async fn get_service(&self, id: &str) -> PortResult<MedicalService>;

    async fn health_check(&self) -> PortResult<bool>;
}

//=========================================================================================
// Device Location Ports
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    High,
    Coarse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Returns the current position.
    ///
    /// `PortError::Timeout` and `PortError::Unavailable` mean a retry at a lower
    /// accuracy may succeed; `PortError::Unauthorized` means permission was denied.
    async fn current_position(&self, accuracy: Accuracy) -> PortResult<Coordinates>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Looks up the address at the given point. `Ok(None)` when nothing was found.
    async fn reverse(&self, coordinates: Coordinates) -> PortResult<Option<Address>>;
}
