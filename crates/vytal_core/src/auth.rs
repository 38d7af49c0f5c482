//! crates/vytal_core/src/auth.rs
//!
//! Phone number sign-in: send an OTP, verify it, and hand the result to the
//! session manager.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::OtpChallenge;
use crate::ports::{AuthService, PortError, SERVER_ERROR_PREFIX};
use crate::session::{SessionError, SessionManager};

/// Country code assumed when the user types a local number.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";
/// Shortest accepted number, including the leading `+` and country code.
pub const MIN_PHONE_LEN: usize = 12;
pub const OTP_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Please enter your phone number")]
    EmptyPhone,
    #[error("Please enter a valid phone number")]
    InvalidPhone,
    #[error("Please enter the complete 6-digit OTP")]
    InvalidCode,
    #[error("{0}")]
    SendFailed(String),
    #[error("{0}")]
    VerificationFailed(String),
    #[error("{0}")]
    ResendFailed(String),
    #[error("Could not save your sign-in: {0}")]
    Storage(#[from] SessionError),
}

/// Where the caller should go after a successful sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    ProfileComplete,
    ProfileIncomplete,
}

/// Trims the input and adds the default country code when it has none.
pub fn normalize_phone(input: &str) -> Result<String, AuthError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AuthError::EmptyPhone);
    }
    let formatted = if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("{}{}", DEFAULT_COUNTRY_CODE, trimmed)
    };
    if formatted.len() < MIN_PHONE_LEN {
        return Err(AuthError::InvalidPhone);
    }
    Ok(formatted)
}

fn validate_code(code: &str) -> Result<(), AuthError> {
    if code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AuthError::InvalidCode)
    }
}

fn message_or(error: &PortError, fallback: &str) -> String {
    match error {
        PortError::Remote { .. } | PortError::Unauthorized(_) => {
            error.server_message().unwrap_or(fallback).to_string()
        }
        PortError::Unexpected(message) if message.starts_with(SERVER_ERROR_PREFIX) => {
            message.clone()
        }
        _ => fallback.to_string(),
    }
}

pub struct PhoneAuthFlow {
    auth: Arc<dyn AuthService>,
    session: Arc<SessionManager>,
}

impl PhoneAuthFlow {
    pub fn new(auth: Arc<dyn AuthService>, session: Arc<SessionManager>) -> Self {
        Self { auth, session }
    }

    pub async fn request_otp(&self, phone_input: &str) -> Result<OtpChallenge, AuthError> {
        let phone = normalize_phone(phone_input)?;
        let challenge = self.auth.send_otp(&phone).await.map_err(|e| {
            warn!(error = %e, "Failed to send OTP");
            AuthError::SendFailed(message_or(&e, "Failed to send OTP"))
        })?;
        info!(expires_in = challenge.expires_in_seconds, "OTP sent");
        Ok(challenge)
    }

    pub async fn resend_otp(&self, challenge: &OtpChallenge) -> Result<OtpChallenge, AuthError> {
        self.auth
            .resend_otp(&challenge.phone_number)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to resend OTP");
                AuthError::ResendFailed(message_or(&e, "Failed to resend OTP"))
            })
    }

    /// Verifies the code and signs the device in. A wrong code leaves the
    /// session untouched so the user can try again or request a new code.
    pub async fn verify_otp(
        &self,
        challenge: &OtpChallenge,
        code: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let code = code.trim();
        validate_code(code)?;

        let verified = self
            .auth
            .verify_otp(&challenge.phone_number, code)
            .await
            .map_err(|e| {
                warn!(error = %e, "OTP verification failed");
                AuthError::VerificationFailed(message_or(&e, "Invalid OTP"))
            })?;

        let outcome = if verified.user.profile_completed {
            LoginOutcome::ProfileComplete
        } else {
            LoginOutcome::ProfileIncomplete
        };
        self.session.login(&verified.token, verified.user).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BackendCall, MockBackend, MockStore};

    async fn setup(backend: MockBackend) -> (Arc<MockBackend>, Arc<MockStore>, Arc<SessionManager>, PhoneAuthFlow) {
        let backend = Arc::new(backend);
        let store = Arc::new(MockStore::new());
        let session = Arc::new(SessionManager::new(store.clone()));
        session.restore().await;
        let flow = PhoneAuthFlow::new(backend.clone(), session.clone());
        (backend, store, session, flow)
    }

    #[test]
    fn normalizes_local_numbers() {
        assert_eq!(normalize_phone(" 9876543210 ").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("+14155550123").unwrap(), "+14155550123");
        assert!(matches!(normalize_phone("   "), Err(AuthError::EmptyPhone)));
        assert!(matches!(normalize_phone("98765"), Err(AuthError::InvalidPhone)));
    }

    #[test]
    fn code_must_be_six_digits() {
        assert!(validate_code("123456").is_ok());
        assert!(validate_code("12345").is_err());
        assert!(validate_code("12a456").is_err());
        assert!(validate_code("1234567").is_err());
    }

    #[tokio::test]
    async fn otp_round_trip_signs_in() {
        let (backend, _store, session, flow) = setup(MockBackend::new()).await;

        let challenge = flow.request_otp("+919876543210").await.unwrap();
        assert_eq!(challenge.phone_number, "+919876543210");

        let outcome = flow.verify_otp(&challenge, "123456").await.unwrap();
        assert_eq!(outcome, LoginOutcome::ProfileIncomplete);

        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.user.unwrap().phone, "+919876543210");
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SendOtp("+919876543210".into()),
                BackendCall::VerifyOtp("+919876543210".into(), "123456".into()),
            ]
        );
    }

    #[tokio::test]
    async fn wrong_code_keeps_session_anonymous() {
        let (_backend, _store, session, flow) = setup(MockBackend::new()).await;
        let challenge = flow.request_otp("9876543210").await.unwrap();

        let result = flow.verify_otp(&challenge, "000000").await;
        match result {
            Err(AuthError::VerificationFailed(message)) => {
                assert_eq!(message, "Invalid or expired OTP")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn malformed_code_makes_no_call() {
        let (backend, _store, _session, flow) = setup(MockBackend::new()).await;
        let challenge = OtpChallenge {
            phone_number: "+919876543210".into(),
            expires_in_seconds: 300,
        };

        let result = flow.verify_otp(&challenge, "12 34").await;
        assert!(matches!(result, Err(AuthError::InvalidCode)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn send_failure_surfaces_server_message() {
        let (_backend, _store, _session, flow) = setup(MockBackend::new().with_otp_error(
            PortError::Remote {
                status: 429,
                message: Some("Too many requests".into()),
            },
        ))
        .await;

        let result = flow.request_otp("+919876543210").await;
        assert!(matches!(result, Err(AuthError::SendFailed(m)) if m == "Too many requests"));
    }

    #[tokio::test]
    async fn transport_details_are_not_shown_to_the_user() {
        let (_backend, _store, _session, flow) = setup(MockBackend::new().with_otp_error(
            PortError::Unexpected(
                "error sending request for url (http://10.0.2.2:4000/api/auth/phone/send-otp)"
                    .into(),
            ),
        ))
        .await;

        let result = flow.request_otp("+919876543210").await;
        assert!(matches!(result, Err(AuthError::SendFailed(m)) if m == "Failed to send OTP"));
    }

    #[tokio::test]
    async fn unparseable_body_excerpt_is_shown() {
        let excerpt = format!("{}<html>tunnel offline</html>...", SERVER_ERROR_PREFIX);
        let (_backend, _store, _session, flow) = setup(
            MockBackend::new().with_otp_error(PortError::Unexpected(excerpt.clone())),
        )
        .await;

        let result = flow.request_otp("+919876543210").await;
        assert!(matches!(result, Err(AuthError::SendFailed(m)) if m == excerpt));
    }

    #[tokio::test]
    async fn rejected_credentials_carry_the_server_message() {
        let (_backend, _store, _session, flow) = setup(MockBackend::new().with_otp_error(
            PortError::Unauthorized(Some("Phone number blocked".into())),
        ))
        .await;

        let result = flow.request_otp("+919876543210").await;
        assert!(matches!(result, Err(AuthError::SendFailed(m)) if m == "Phone number blocked"));
    }

    #[tokio::test]
    async fn resend_uses_challenge_phone() {
        let (backend, _store, _session, flow) = setup(MockBackend::new()).await;
        let challenge = flow.request_otp("9876543210").await.unwrap();
        let renewed = flow.resend_otp(&challenge).await.unwrap();
        assert_eq!(renewed.phone_number, "+919876543210");
        assert_eq!(
            backend.calls().last(),
            Some(&BackendCall::ResendOtp("+919876543210".into()))
        );
    }

    #[tokio::test]
    async fn storage_failure_during_login_is_reported() {
        let (_backend, store, session, flow) = setup(MockBackend::new()).await;
        store.fail_writes(true);
        let challenge = flow.request_otp("+919876543210").await.unwrap();

        let result = flow.verify_otp(&challenge, "123456").await;
        assert!(matches!(result, Err(AuthError::Storage(_))));
        assert!(!session.is_authenticated());
    }
}
