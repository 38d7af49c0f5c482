//! services/client/src/adapters/booking_api.rs
//!
//! The adapter for appointment creation. It implements the `BookingService` port.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use vytal_core::domain::BookingRequest;
use vytal_core::ports::{BookingService, PortResult};

use super::http::{bearer, BackendClient};

const BOOKINGS: &str = "/api/bookings";

#[derive(Clone)]
pub struct HttpBookingAdapter {
    client: BackendClient,
}

impl HttpBookingAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookingService for HttpBookingAdapter {
    async fn create_booking(
        &self,
        token: &str,
        request: &BookingRequest,
    ) -> PortResult<serde_json::Value> {
        let http_request = self
            .client
            .post(BOOKINGS)
            .header(AUTHORIZATION, bearer(token))
            .json(request);
        self.client.send(http_request).await
    }
}
