//! crates/vytal_core/src/onboarding.rs
//!
//! Remembers whether the intro slides have been shown on this device.

use std::sync::Arc;

use tracing::debug;

use crate::ports::KeyValueStore;

pub const ONBOARDING_KEY: &str = "onboardingCompleted";

pub struct OnboardingFlag {
    store: Arc<dyn KeyValueStore>,
}

impl OnboardingFlag {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Storage errors are ignored; onboarding simply shows again.
    pub async fn mark_completed(&self, completed: bool) {
        let value = if completed { "true" } else { "false" };
        if let Err(e) = self.store.set(ONBOARDING_KEY, value).await {
            debug!(error = %e, "Could not store onboarding flag");
        }
    }

    pub async fn is_completed(&self) -> bool {
        matches!(self.store.get(ONBOARDING_KEY).await, Ok(Some(v)) if v == "true")
    }
}
