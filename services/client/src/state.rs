//! services/client/src/state.rs
//!
//! Wires the adapters into the core flows. Built once at startup and shared
//! by every command.

use std::sync::Arc;

use tracing::info;
use vytal_core::ports::{CatalogService, KeyValueStore, PaymentAuthorizer, ReverseGeocoder};
use vytal_core::{
    BookingFlow, LocationResolver, OnboardingFlag, PhoneAuthFlow, ProfileFlow, SessionManager,
};

use crate::adapters::{
    BackendClient, FixedLocationProvider, HttpAuthAdapter, HttpBookingAdapter, HttpCatalogAdapter,
    HttpPaymentAdapter, HttpProfileAdapter, NominatimGeocoder, SqliteStore,
};
use crate::config::Config;
use crate::error::ClientError;

/// The client's shared state, created once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<SessionManager>,
    pub auth: PhoneAuthFlow,
    pub profile: ProfileFlow,
    pub booking: BookingFlow,
    pub catalog: Arc<dyn CatalogService>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub onboarding: OnboardingFlag,
}

impl AppState {
    /// Connects the store, builds the adapters and restores the session.
    pub async fn build(
        config: Arc<Config>,
        authorizer: Arc<dyn PaymentAuthorizer>,
    ) -> Result<Self, ClientError> {
        info!("Opening local store...");
        let store: Arc<dyn KeyValueStore> =
            Arc::new(SqliteStore::connect(&config.database_url).await?);

        let backend = BackendClient::new(&config.api_base_url, config.http_timeout)?;
        let geocoder: Arc<dyn ReverseGeocoder> = Arc::new(NominatimGeocoder::new(
            &config.geocoder_url,
            &config.user_agent,
            config.http_timeout,
        )?);

        let session = Arc::new(SessionManager::new(store.clone()));
        session.restore().await;

        let auth = PhoneAuthFlow::new(Arc::new(HttpAuthAdapter::new(backend.clone())), session.clone());
        let profile = ProfileFlow::new(
            Arc::new(HttpProfileAdapter::new(backend.clone())),
            session.clone(),
        );
        let booking = BookingFlow::new(
            session.clone(),
            Arc::new(HttpBookingAdapter::new(backend.clone())),
            Arc::new(HttpPaymentAdapter::new(backend.clone())),
            authorizer,
        );
        let catalog: Arc<dyn CatalogService> = Arc::new(HttpCatalogAdapter::new(backend));
        let onboarding = OnboardingFlag::new(store);

        Ok(Self {
            config,
            session,
            auth,
            profile,
            booking,
            catalog,
            geocoder,
            onboarding,
        })
    }

    /// A resolver that reports the given coordinates as the device position.
    pub fn location_resolver(&self, latitude: f64, longitude: f64) -> LocationResolver {
        LocationResolver::with_timeout(
            Arc::new(FixedLocationProvider::new(latitude, longitude)),
            self.geocoder.clone(),
            self.config.location_timeout,
        )
    }
}
