pub mod auth;
pub mod booking;
pub mod catalog;
pub mod domain;
pub mod location;
pub mod onboarding;
pub mod ports;
pub mod profile;
pub mod session;

#[cfg(test)]
mod testing;

pub use auth::{normalize_phone, AuthError, LoginOutcome, PhoneAuthFlow};
pub use booking::{BookingError, BookingFlow, BookingOutcome, BookingPlan, PaymentMode};
pub use domain::{
    Address, BookingRequest, Location, MedicalService, OrderDescriptor, OtpChallenge,
    PaymentAuthorization, ProfileUpdate, ServiceCategory, Session, Sex, SlotSelection,
    UserProfile,
};
pub use location::{AddressLookup, LocationError, LocationFix, LocationResolver};
pub use onboarding::OnboardingFlag;
pub use ports::{
    AuthService, BookingService, CatalogService, KeyValueStore, LocationProvider,
    PaymentAuthorizer, PaymentService, PortError, PortResult, ProfileService, ReverseGeocoder,
};
pub use profile::{ProfileError, ProfileFlow, ProfileForm};
pub use session::{SessionError, SessionManager, SessionObserver};
