//! crates/vytal_core/src/profile.rs
//!
//! Profile completion, address changes and refreshes. Each one sends the
//! change to the server and adopts the user it returns.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Location, ProfileUpdate, Sex, UserProfile};
use crate::ports::{PortError, ProfileService};
use crate::session::SessionManager;

pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 150;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Please enter your name")]
    NameRequired,
    #[error("Please enter a valid age")]
    InvalidAge,
    #[error("Please provide your address")]
    AddressRequired,
    #[error("Authentication required")]
    NotAuthenticated,
    #[error("{0}")]
    UpdateFailed(String),
    #[error("{0}")]
    FetchFailed(String),
}

/// The fields collected when a user completes their profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub location: Option<Location>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::NameRequired);
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ProfileError::InvalidAge);
        }
        let has_address = self
            .location
            .as_ref()
            .is_some_and(|l| l.address.is_deliverable());
        if !has_address {
            return Err(ProfileError::AddressRequired);
        }
        Ok(())
    }
}

fn message_or(error: &PortError, fallback: &str) -> String {
    error.server_message().unwrap_or(fallback).to_string()
}

pub struct ProfileFlow {
    profiles: Arc<dyn ProfileService>,
    session: Arc<SessionManager>,
}

impl ProfileFlow {
    pub fn new(profiles: Arc<dyn ProfileService>, session: Arc<SessionManager>) -> Self {
        Self { profiles, session }
    }

    fn token(&self) -> Result<String, ProfileError> {
        self.session.token().ok_or(ProfileError::NotAuthenticated)
    }

    async fn apply(&self, token: &str, update: &ProfileUpdate) -> Result<UserProfile, ProfileError> {
        let user = self
            .profiles
            .update_profile(token, update)
            .await
            .map_err(|e| {
                warn!(error = %e, "Profile update failed");
                ProfileError::UpdateFailed(message_or(&e, "Failed to update profile"))
            })?;
        self.adopt(&user).await;
        Ok(user)
    }

    /// Caches the user and waits for it to reach the store, so a short-lived
    /// process does not exit with the write still pending. Write failures are
    /// reported through the session observer.
    async fn adopt(&self, user: &UserProfile) {
        if let Some(write) = self.session.update_user(user.clone()) {
            if let Err(e) = write.await {
                warn!(error = %e, "Profile write task did not finish");
            }
        }
    }

    /// Validates the form, sends it and adopts the returned user.
    pub async fn complete_profile(&self, form: ProfileForm) -> Result<UserProfile, ProfileError> {
        form.validate()?;
        let token = self.token()?;
        let update = ProfileUpdate {
            name: Some(form.name.trim().to_string()),
            age: Some(form.age),
            sex: Some(form.sex),
            location: form.location,
        };
        let user = self.apply(&token, &update).await?;
        info!(user_id = %user.id, "Profile completed");
        Ok(user)
    }

    /// Replaces the saved address, keeping the other profile fields as they are.
    pub async fn save_address(&self, location: Location) -> Result<UserProfile, ProfileError> {
        if !location.address.is_deliverable() {
            return Err(ProfileError::AddressRequired);
        }
        let token = self.token()?;
        let current = self.session.user();
        let update = ProfileUpdate {
            name: current.as_ref().and_then(|u| u.name.clone()),
            age: current.as_ref().and_then(|u| u.age),
            sex: current.as_ref().and_then(|u| u.sex),
            location: Some(location),
        };
        let user = self.apply(&token, &update).await?;
        info!(user_id = %user.id, "Address saved");
        Ok(user)
    }

    /// Fetches the server's copy of the profile and adopts it.
    pub async fn refresh_profile(&self) -> Result<UserProfile, ProfileError> {
        let token = self.token()?;
        let user = self.profiles.get_profile(&token).await.map_err(|e| {
            warn!(error = %e, "Profile fetch failed");
            ProfileError::FetchFailed(message_or(&e, "Failed to get profile"))
        })?;
        self.adopt(&user).await;
        Ok(user)
    }
}
