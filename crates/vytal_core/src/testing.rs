//! crates/vytal_core/src/testing.rs
//!
//! Mock collaborators for unit tests. Each mock records the calls it
//! receives and replays scripted responses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    Address, BookingRequest, Location, MedicalService, OrderDescriptor, OtpChallenge,
    PaymentAuthorization, PaymentOrder, ProfileUpdate, ServiceCategory, Sex, UserProfile,
    VerifiedLogin,
};
use crate::ports::{
    Accuracy, AuthService, BookingService, CatalogService, Coordinates, KeyValueStore,
    LocationProvider, PaymentAuthorizer, PaymentService, PortError, PortResult, ProfileService,
    ReverseGeocoder,
};
use crate::session::SessionObserver;

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn sample_user(phone: &str) -> UserProfile {
    UserProfile {
        id: "user-1".to_string(),
        phone: phone.to_string(),
        email: None,
        name: None,
        age: None,
        sex: None,
        profile_completed: false,
        is_phone_verified: true,
        location: None,
    }
}

pub fn baker_street() -> Address {
    Address {
        street: "221B Baker St".to_string(),
        city: "City".to_string(),
        formatted_address: "221B Baker St, City".to_string(),
        ..Default::default()
    }
}

pub fn user_with_address(address: Address) -> UserProfile {
    UserProfile {
        name: Some("Asha".to_string()),
        age: Some(30),
        sex: Some(Sex::Female),
        profile_completed: true,
        location: Some(Location {
            latitude: 18.52,
            longitude: 73.85,
            address,
        }),
        ..sample_user("+919876543210")
    }
}

//=========================================================================================
// Mock Store
//=========================================================================================

#[derive(Default)]
pub struct MockStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
    failing_keys: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fails writes to `key` only, leaving other keys writable.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys.lock().unwrap().push(key.to_string());
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Storage("read failed".to_string()));
        }
        Ok(self.get_raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst)
            || self.failing_keys.lock().unwrap().iter().any(|k| k == key)
        {
            return Err(PortError::Storage("quota exceeded".to_string()));
        }
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(PortError::Storage("delete failed".to_string()));
        }
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    failed: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn failed_keys(&self) -> Vec<String> {
        self.failed.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn persistence_failed(&self, key: &str, _error: &PortError) {
        self.failed.lock().unwrap().push(key.to_string());
    }
}

//=========================================================================================
// Mock Backend
//=========================================================================================

/// Every remote call the mock backend received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SendOtp(String),
    VerifyOtp(String, String),
    ResendOtp(String),
    GetProfile(String),
    UpdateProfile(String, ProfileUpdate),
    CreateBooking(String, BookingRequest),
    CreateOrder(String, u64),
    VerifyPayment(String, PaymentAuthorization),
    Authorize(String),
}

/// One mock standing in for every remote collaborator, so tests can assert
/// on the overall call order.
pub struct MockBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    pub valid_code: String,
    pub otp_error: Mutex<Option<PortError>>,
    pub profile_result: Mutex<Option<PortResult<UserProfile>>>,
    pub booking_result: Mutex<Option<PortResult<serde_json::Value>>>,
    pub order_result: Mutex<Option<PortResult<OrderDescriptor>>>,
    pub authorize_result: Mutex<Option<PortResult<PaymentAuthorization>>>,
    pub verify_result: Mutex<Option<PortResult<()>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            valid_code: "123456".to_string(),
            otp_error: Mutex::new(None),
            profile_result: Mutex::new(None),
            booking_result: Mutex::new(None),
            order_result: Mutex::new(None),
            authorize_result: Mutex::new(None),
            verify_result: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn with_otp_error(self, error: PortError) -> Self {
        *self.otp_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_profile_result(self, result: PortResult<UserProfile>) -> Self {
        *self.profile_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_booking_result(self, result: PortResult<serde_json::Value>) -> Self {
        *self.booking_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_order_result(self, result: PortResult<OrderDescriptor>) -> Self {
        *self.order_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_authorize_result(self, result: PortResult<PaymentAuthorization>) -> Self {
        *self.authorize_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_verify_result(self, result: PortResult<()>) -> Self {
        *self.verify_result.lock().unwrap() = Some(result);
        self
    }

    fn challenge(&self, phone: &str) -> PortResult<OtpChallenge> {
        if let Some(e) = self.otp_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(OtpChallenge {
            phone_number: phone.to_string(),
            expires_in_seconds: 300,
        })
    }
}

pub fn sample_order() -> OrderDescriptor {
    OrderDescriptor {
        order: PaymentOrder {
            id: "order_1".to_string(),
            amount: 100_000,
            currency: "INR".to_string(),
        },
        key_id: "rzp_test_key".to_string(),
    }
}

pub fn sample_authorization() -> PaymentAuthorization {
    PaymentAuthorization {
        order_id: "order_1".to_string(),
        payment_id: "pay_1".to_string(),
        signature: "sig_1".to_string(),
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn send_otp(&self, phone_number: &str) -> PortResult<OtpChallenge> {
        self.record(BackendCall::SendOtp(phone_number.to_string()));
        self.challenge(phone_number)
    }

    async fn verify_otp(&self, phone_number: &str, code: &str) -> PortResult<VerifiedLogin> {
        self.record(BackendCall::VerifyOtp(
            phone_number.to_string(),
            code.to_string(),
        ));
        if code != self.valid_code {
            return Err(PortError::Remote {
                status: 400,
                message: Some("Invalid or expired OTP".to_string()),
            });
        }
        Ok(VerifiedLogin {
            token: "tok_abc".to_string(),
            user: sample_user(phone_number),
        })
    }

    async fn resend_otp(&self, phone_number: &str) -> PortResult<OtpChallenge> {
        self.record(BackendCall::ResendOtp(phone_number.to_string()));
        self.challenge(phone_number)
    }
}

#[async_trait]
impl ProfileService for MockBackend {
    async fn get_profile(&self, token: &str) -> PortResult<UserProfile> {
        self.record(BackendCall::GetProfile(token.to_string()));
        self.profile_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(user_with_address(baker_street())))
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> PortResult<UserProfile> {
        self.record(BackendCall::UpdateProfile(token.to_string(), update.clone()));
        if let Some(result) = self.profile_result.lock().unwrap().clone() {
            return result;
        }
        Ok(UserProfile {
            name: update.name.clone(),
            age: update.age,
            sex: update.sex,
            location: update.location.clone(),
            profile_completed: true,
            ..sample_user("+919876543210")
        })
    }
}

#[async_trait]
impl BookingService for MockBackend {
    async fn create_booking(
        &self,
        token: &str,
        request: &BookingRequest,
    ) -> PortResult<serde_json::Value> {
        self.record(BackendCall::CreateBooking(token.to_string(), request.clone()));
        self.booking_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(serde_json::json!({ "_id": "booking-1", "status": "pending" })))
    }
}

#[async_trait]
impl PaymentService for MockBackend {
    async fn create_order(&self, token: &str, amount: u64) -> PortResult<OrderDescriptor> {
        self.record(BackendCall::CreateOrder(token.to_string(), amount));
        self.order_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(sample_order()))
    }

    async fn verify_payment(
        &self,
        token: &str,
        authorization: &PaymentAuthorization,
    ) -> PortResult<()> {
        self.record(BackendCall::VerifyPayment(
            token.to_string(),
            authorization.clone(),
        ));
        self.verify_result.lock().unwrap().clone().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl PaymentAuthorizer for MockBackend {
    async fn authorize(&self, order: &OrderDescriptor) -> PortResult<PaymentAuthorization> {
        self.record(BackendCall::Authorize(order.order.id.clone()));
        self.authorize_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(sample_authorization()))
    }
}

#[async_trait]
impl CatalogService for MockBackend {
    async fn list_services(
        &self,
        _category: Option<ServiceCategory>,
    ) -> PortResult<Vec<MedicalService>> {
        Ok(Vec::new())
    }

    async fn get_service(&self, id: &str) -> PortResult<MedicalService> {
        Err(PortError::NotFound(format!("Service {} not found", id)))
    }

    async fn health_check(&self) -> PortResult<bool> {
        Ok(true)
    }
}

//=========================================================================================
// Mock Location Services
//=========================================================================================

/// How the mock provider answers a request at one accuracy level.
#[derive(Clone)]
pub enum FixBehavior {
    Fix(Coordinates),
    Fail(PortError),
    Hang(Duration),
}

pub struct MockLocationProvider {
    high: FixBehavior,
    coarse: FixBehavior,
    requests: Mutex<Vec<Accuracy>>,
}

impl MockLocationProvider {
    pub fn new(high: FixBehavior, coarse: FixBehavior) -> Self {
        Self {
            high,
            coarse,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Accuracy> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    async fn current_position(&self, accuracy: Accuracy) -> PortResult<Coordinates> {
        self.requests.lock().unwrap().push(accuracy);
        let behavior = match accuracy {
            Accuracy::High => self.high.clone(),
            Accuracy::Coarse => self.coarse.clone(),
        };
        match behavior {
            FixBehavior::Fix(c) => Ok(c),
            FixBehavior::Fail(e) => Err(e),
            FixBehavior::Hang(d) => {
                tokio::time::sleep(d).await;
                Err(PortError::Unexpected("provider hung".to_string()))
            }
        }
    }
}

pub struct MockGeocoder {
    result: PortResult<Option<Address>>,
    lookups: Mutex<Vec<Coordinates>>,
}

impl MockGeocoder {
    pub fn new(result: PortResult<Option<Address>>) -> Self {
        Self {
            result,
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> PortResult<Option<Address>> {
        self.lookups.lock().unwrap().push(coordinates);
        self.result.clone()
    }
}
