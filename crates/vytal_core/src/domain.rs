//! crates/vytal_core/src/domain.rs
//!
//! Defines the core data structures of the client: the user profile and its
//! address, the session mirror, OTP challenges, bookings and catalog entries.
//! Field names follow the backend's camelCase JSON so these types can be
//! stored and sent without separate record structs.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// User Profile
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Other,
}

/// A postal address. Every field is free text and any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub landmark: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub formatted_address: String,
}

impl Address {
    /// An address is usable for a visit when it has a street or a formatted address.
    pub fn is_deliverable(&self) -> bool {
        !self.street.trim().is_empty() || !self.formatted_address.trim().is_empty()
    }

    /// A single line suitable for display.
    pub fn display_line(&self) -> String {
        if !self.formatted_address.is_empty() {
            self.formatted_address.clone()
        } else {
            format!("{}, {}", self.street, self.city)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Address,
}

/// The authenticated user, as last reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub is_phone_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl UserProfile {
    pub fn address(&self) -> Option<&Address> {
        self.location.as_ref().map(|l| &l.address)
    }

    pub fn has_deliverable_address(&self) -> bool {
        self.address().map(Address::is_deliverable).unwrap_or(false)
    }
}

/// The payload of a profile update. `location` is omitted when unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

//=========================================================================================
// Session
//=========================================================================================

/// A point-in-time view of the session held by the `SessionManager`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub return_route: Option<String>,
}

//=========================================================================================
// Phone Verification
//=========================================================================================

/// An OTP that has been sent and not yet verified. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub phone_number: String,
    pub expires_in_seconds: u64,
}

/// Result of a successful OTP verification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifiedLogin {
    pub token: String,
    pub user: UserProfile,
}

//=========================================================================================
// Bookings
//=========================================================================================

/// The hourly slot labels offered for appointments.
pub const TIME_SLOTS: [&str; 11] = [
    "08:00 AM", "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "01:00 PM", "02:00 PM",
    "03:00 PM", "04:00 PM", "05:00 PM", "06:00 PM",
];

/// How many days ahead an appointment can be requested, starting today.
pub const BOOKING_WINDOW_DAYS: i64 = 14;

/// The dates a user may pick from, starting with `today`.
pub fn bookable_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..BOOKING_WINDOW_DAYS)
        .map(|offset| today + Duration::days(offset))
        .collect()
}

/// Bookable dates starting from the local calendar day.
pub fn bookable_dates_from_today() -> Vec<NaiveDate> {
    bookable_dates(Local::now().date_naive())
}

/// What the user picked on the booking screen. Either part may still be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotSelection {
    pub date: Option<DateTime<Utc>>,
    pub time_slot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: String,
    pub preferred_date: DateTime<Utc>,
    pub preferred_time_slot: String,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
}

/// Everything the payment sheet needs to collect an authorization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDescriptor {
    pub order: PaymentOrder,
    pub key_id: String,
}

/// The proof returned by the payment gateway after the user pays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentAuthorization {
    #[serde(rename = "razorpay_order_id")]
    pub order_id: String,
    #[serde(rename = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(rename = "razorpay_signature")]
    pub signature: String,
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    IvDrips,
    Diagnostics,
    RedLight,
    Hyperbaric,
    Longevity,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::IvDrips => "iv_drips",
            ServiceCategory::Diagnostics => "diagnostics",
            ServiceCategory::RedLight => "red_light",
            ServiceCategory::Hyperbaric => "hyperbaric",
            ServiceCategory::Longevity => "longevity",
        }
    }
}

impl std::str::FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iv_drips" => Ok(ServiceCategory::IvDrips),
            "diagnostics" => Ok(ServiceCategory::Diagnostics),
            "red_light" => Ok(ServiceCategory::RedLight),
            "hyperbaric" => Ok(ServiceCategory::Hyperbaric),
            "longevity" => Ok(ServiceCategory::Longevity),
            other => Err(format!("unknown service category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Subscription,
    Individual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailSection {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

/// A bookable service from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicalService {
    pub id: String,
    pub category: Option<ServiceCategory>,
    pub title: String,
    pub subtitle: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub price: Option<String>,
    pub session_info: Option<String>,
    pub tagline: Option<String>,
    pub bullets: Vec<String>,
    pub sections: Vec<DetailSection>,
    pub image_url: Option<String>,
    pub service_type: Option<ServiceType>,
}
