//! services/client/src/adapters/payment_api.rs
//!
//! The adapter for the payment order and verification endpoints. It
//! implements the `PaymentService` port.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use vytal_core::domain::{OrderDescriptor, PaymentAuthorization};
use vytal_core::ports::{PaymentService, PortResult};

use super::http::{bearer, BackendClient};

const CREATE_ORDER: &str = "/api/payments/create-order";
const VERIFY: &str = "/api/payments/verify";

#[derive(Clone)]
pub struct HttpPaymentAdapter {
    client: BackendClient,
}

impl HttpPaymentAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentService for HttpPaymentAdapter {
    async fn create_order(&self, token: &str, amount: u64) -> PortResult<OrderDescriptor> {
        let request = self
            .client
            .post(CREATE_ORDER)
            .header(AUTHORIZATION, bearer(token))
            .json(&json!({ "amount": amount }));
        self.client.send_as(request, None).await
    }

    async fn verify_payment(
        &self,
        token: &str,
        authorization: &PaymentAuthorization,
    ) -> PortResult<()> {
        let request = self
            .client
            .post(VERIFY)
            .header(AUTHORIZATION, bearer(token))
            .json(authorization);
        self.client.send(request).await?;
        Ok(())
    }
}
