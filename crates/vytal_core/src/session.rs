//! crates/vytal_core/src/session.rs
//!
//! The session manager: the single owner of "is this device signed in, as
//! whom, with which token". The key-value store holds a serialized mirror
//! that is read back once at startup.
//!
//! Concurrent `login`/`logout` calls are not coordinated with each other.
//! Only one sign-in flow is expected to be active at a time; the in-memory
//! state sits behind a lock so readers never see a torn value, and the last
//! writer wins.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{Session, UserProfile};
use crate::ports::{KeyValueStore, PortError};

pub const TOKEN_KEY: &str = "@vytalyou_token";
pub const USER_KEY: &str = "@vytalyou_user";
pub const RETURN_ROUTE_KEY: &str = "@vytalyou_return_route";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Refusing to store an empty session token")]
    EmptyToken,
    #[error("Could not serialize the user profile: {0}")]
    Serialization(String),
    #[error("Could not persist the session: {0}")]
    Storage(#[source] PortError),
}

/// Receives failures of writes the caller did not wait for.
pub trait SessionObserver: Send + Sync {
    fn persistence_failed(&self, key: &str, error: &PortError);
}

/// Reports background write failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn persistence_failed(&self, key: &str, error: &PortError) {
        warn!(key, %error, "Background session write failed");
    }
}

#[derive(Debug)]
struct SessionState {
    token: Option<String>,
    user: Option<UserProfile>,
    loading: bool,
    return_route: Option<String>,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            token: None,
            user: None,
            loading: true,
            return_route: None,
        }
    }

    fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn clear(&mut self) {
        self.token = None;
        self.user = None;
        self.return_route = None;
    }
}

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    observer: Arc<dyn SessionObserver>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_observer(store, Arc::new(TracingObserver))
    }

    pub fn with_observer(store: Arc<dyn KeyValueStore>, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            store,
            observer,
            state: RwLock::new(SessionState::initial()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    //=====================================================================================
    // Read Access
    //=====================================================================================

    pub fn snapshot(&self) -> Session {
        let state = self.read_state();
        Session {
            is_authenticated: state.is_authenticated(),
            token: state.token.clone(),
            user: state.user.clone(),
            loading: state.loading,
            return_route: state.return_route.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().loading
    }

    pub fn token(&self) -> Option<String> {
        self.read_state().token.clone().filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read_state().user.clone()
    }

    pub fn return_route(&self) -> Option<String> {
        self.read_state().return_route.clone()
    }

    //=====================================================================================
    // Transitions
    //=====================================================================================

    /// Reloads the persisted session. Never fails: anything unreadable leaves
    /// the device signed out. `loading` is false once this returns.
    pub async fn restore(&self) {
        let (token, user, route) = futures::join!(
            self.store.get(TOKEN_KEY),
            self.store.get(USER_KEY),
            self.store.get(RETURN_ROUTE_KEY),
        );

        let restored = match (token, user) {
            (Ok(Some(token)), Ok(Some(raw_user))) if !token.is_empty() => {
                match serde_json::from_str::<UserProfile>(&raw_user) {
                    Ok(user) => Some((token, user)),
                    Err(e) => {
                        warn!(error = %e, "Stored user profile is unreadable, starting signed out");
                        None
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to load auth data, starting signed out");
                None
            }
            _ => None,
        };

        let return_route = match route {
            Ok(route) => route,
            Err(e) => {
                warn!(error = %e, "Failed to load return route");
                None
            }
        };

        let mut state = self.write_state();
        match restored {
            Some((token, user)) => {
                info!(user_id = %user.id, "Restored session");
                state.token = Some(token);
                state.user = Some(user);
            }
            None => {
                debug!("No stored session");
                state.token = None;
                state.user = None;
            }
        }
        state.return_route = return_route;
        state.loading = false;
    }

    /// Persists and adopts a new session. The in-memory state only changes
    /// once both values are stored.
    pub async fn login(&self, token: &str, user: UserProfile) -> Result<(), SessionError> {
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let serialized =
            serde_json::to_string(&user).map_err(|e| SessionError::Serialization(e.to_string()))?;

        // Kept so a failed login leaves any stored session as it was.
        let previous_token = self.store.get(TOKEN_KEY).await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not read the stored token before login");
            None
        });

        self.store
            .set(TOKEN_KEY, token)
            .await
            .map_err(SessionError::Storage)?;
        if let Err(e) = self.store.set(USER_KEY, &serialized).await {
            let rollback = match &previous_token {
                Some(previous) => self.store.set(TOKEN_KEY, previous).await,
                None => self.store.remove(TOKEN_KEY).await,
            };
            if let Err(cleanup) = rollback {
                warn!(error = %cleanup, "Failed to roll back partially written token");
            }
            return Err(SessionError::Storage(e));
        }

        info!(user_id = %user.id, "Signed in");
        let mut state = self.write_state();
        state.token = Some(token.to_string());
        state.user = Some(user);
        Ok(())
    }

    /// Signs out. Storage failures are logged; memory is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self
            .store
            .remove_many(&[TOKEN_KEY, USER_KEY, RETURN_ROUTE_KEY])
            .await
        {
            warn!(error = %e, "Failed to clear auth data");
        }
        self.write_state().clear();
        info!("Signed out");
    }

    /// Replaces the cached user immediately and persists it in the background.
    ///
    /// The returned handle may be dropped; write failures go to the observer.
    pub fn update_user(&self, user: UserProfile) -> Option<JoinHandle<()>> {
        let serialized = serde_json::to_string(&user);
        self.write_state().user = Some(user);

        let serialized = match serialized {
            Ok(s) => s,
            Err(e) => {
                self.observer
                    .persistence_failed(USER_KEY, &PortError::Unexpected(e.to_string()));
                return None;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.observer.persistence_failed(
                USER_KEY,
                &PortError::Unavailable("no async runtime for background write".to_string()),
            );
            return None;
        };

        let store = self.store.clone();
        let observer = self.observer.clone();
        Some(runtime.spawn(async move {
            if let Err(e) = store.set(USER_KEY, &serialized).await {
                observer.persistence_failed(USER_KEY, &e);
            }
        }))
    }

    /// Remembers where to send the user after signing in. `None` forgets it.
    pub async fn set_return_route(&self, route: Option<String>) {
        self.write_state().return_route = route.clone();
        let result = match route {
            Some(route) => self.store.set(RETURN_ROUTE_KEY, &route).await,
            None => self.store.remove(RETURN_ROUTE_KEY).await,
        };
        if let Err(e) = result {
            self.observer.persistence_failed(RETURN_ROUTE_KEY, &e);
        }
    }
}
