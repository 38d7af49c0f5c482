pub mod auth_api;
pub mod booking_api;
pub mod catalog_api;
pub mod fixed_location;
pub mod geocoder;
pub mod http;
pub mod payment_api;
pub mod payment_sheet;
pub mod profile_api;
pub mod store;

pub use auth_api::HttpAuthAdapter;
pub use booking_api::HttpBookingAdapter;
pub use catalog_api::HttpCatalogAdapter;
pub use fixed_location::FixedLocationProvider;
pub use geocoder::NominatimGeocoder;
pub use http::BackendClient;
pub use payment_api::HttpPaymentAdapter;
pub use payment_sheet::ConsolePaymentSheet;
pub use profile_api::HttpProfileAdapter;
pub use store::SqliteStore;
