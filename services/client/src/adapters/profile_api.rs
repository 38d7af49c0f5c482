//! services/client/src/adapters/profile_api.rs
//!
//! The adapter for `/api/profile`. It implements the `ProfileService` port.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use vytal_core::domain::{ProfileUpdate, UserProfile};
use vytal_core::ports::{PortResult, ProfileService};

use super::http::{bearer, BackendClient};

const PROFILE: &str = "/api/profile";

#[derive(Clone)]
pub struct HttpProfileAdapter {
    client: BackendClient,
}

impl HttpProfileAdapter {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileService for HttpProfileAdapter {
    async fn get_profile(&self, token: &str) -> PortResult<UserProfile> {
        let request = self.client.get(PROFILE).header(AUTHORIZATION, bearer(token));
        self.client.send_as(request, Some("user")).await
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> PortResult<UserProfile> {
        let request = self
            .client
            .put(PROFILE)
            .header(AUTHORIZATION, bearer(token))
            .json(update);
        self.client.send_as(request, Some("user")).await
    }
}
