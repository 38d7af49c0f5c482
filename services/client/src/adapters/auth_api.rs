//! services/client/src/adapters/auth_api.rs
//!
//! The adapter for the phone/OTP endpoints. It implements the `AuthService`
//! port from the core crate.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use vytal_core::domain::{OtpChallenge, VerifiedLogin};
use vytal_core::ports::{AuthService, PortResult};

use super::http::BackendClient;

const SEND_OTP: &str = "/api/auth/phone/send-otp";
const VERIFY_OTP: &str = "/api/auth/phone/verify-otp";
const RESEND_OTP: &str = "/api/auth/phone/resend-otp";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OtpResponse {
    #[serde(default)]
    expires_in: u64,
}

#[derive(Clone)]
pub struct HttpAuthAdapter {
    client: BackendClient,
}

impl HttpAuthAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn request_code(&self, path: &str, phone_number: &str) -> PortResult<OtpChallenge> {
        let request = self
            .client
            .post(path)
            .json(&json!({ "phoneNumber": phone_number }));
        let response: OtpResponse = self.client.send_as(request, None).await?;
        Ok(OtpChallenge {
            phone_number: phone_number.to_string(),
            expires_in_seconds: response.expires_in,
        })
    }
}

#[async_trait]
impl AuthService for HttpAuthAdapter {
    async fn send_otp(&self, phone_number: &str) -> PortResult<OtpChallenge> {
        self.request_code(SEND_OTP, phone_number).await
    }

    async fn verify_otp(&self, phone_number: &str, code: &str) -> PortResult<VerifiedLogin> {
        let request = self
            .client
            .post(VERIFY_OTP)
            .json(&json!({ "phoneNumber": phone_number, "otp": code }));
        self.client.send_as(request, None).await
    }

    async fn resend_otp(&self, phone_number: &str) -> PortResult<OtpChallenge> {
        self.request_code(RESEND_OTP, phone_number).await
    }
}
