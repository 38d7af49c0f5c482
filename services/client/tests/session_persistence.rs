//! Each `vytal` command is its own process. These tests run every step on a
//! fresh runtime over one SQLite file, the way consecutive commands would.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use client_lib::adapters::SqliteStore;
use tokio::runtime::{Builder, Runtime};
use vytal_core::domain::{Address, Location, ProfileUpdate, Sex, UserProfile};
use vytal_core::ports::{PortResult, ProfileService};
use vytal_core::{ProfileFlow, ProfileForm, SessionManager};

/// Echoes every update back as the server's copy of the user.
struct EchoProfiles;

#[async_trait]
impl ProfileService for EchoProfiles {
    async fn get_profile(&self, _token: &str) -> PortResult<UserProfile> {
        Ok(base_user())
    }

    async fn update_profile(&self, _token: &str, update: &ProfileUpdate) -> PortResult<UserProfile> {
        Ok(UserProfile {
            name: update.name.clone(),
            age: update.age,
            sex: update.sex,
            location: update.location.clone(),
            profile_completed: true,
            ..base_user()
        })
    }
}

fn base_user() -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        phone: "+919876543210".to_string(),
        email: None,
        name: None,
        age: None,
        sex: None,
        profile_completed: false,
        is_phone_verified: true,
        location: None,
    }
}

fn mg_road() -> Location {
    Location {
        latitude: 12.97,
        longitude: 77.59,
        address: Address {
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            ..Default::default()
        },
    }
}

fn database_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "vytal-{}-{}-{}.db",
        label,
        std::process::id(),
        nanos
    ))
}

fn runtime() -> Runtime {
    Builder::new_current_thread().enable_all().build().unwrap()
}

async fn open_session(url: &str) -> Arc<SessionManager> {
    let store = Arc::new(SqliteStore::connect(url).await.unwrap());
    let session = Arc::new(SessionManager::new(store));
    session.restore().await;
    session
}

#[test]
fn profile_updates_survive_separate_invocations() {
    let path = database_path("profile");
    let url = format!("sqlite://{}", path.display());

    runtime().block_on(async {
        let session = open_session(&url).await;
        session.login("tok_abc", base_user()).await.unwrap();
    });

    for age in 1..=20u32 {
        runtime().block_on(async {
            let session = open_session(&url).await;
            let flow = ProfileFlow::new(Arc::new(EchoProfiles), session);
            flow.complete_profile(ProfileForm {
                name: "Asha".to_string(),
                age,
                sex: Sex::Female,
                location: Some(mg_road()),
            })
            .await
            .unwrap();
        });

        let stored = runtime().block_on(async { open_session(&url).await.user() });
        let stored = stored.expect("user should be restored");
        assert_eq!(stored.age, Some(age));
        assert!(stored.has_deliverable_address());
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn saved_address_is_there_for_the_next_command() {
    let path = database_path("address");
    let url = format!("sqlite://{}", path.display());

    runtime().block_on(async {
        let session = open_session(&url).await;
        session.login("tok_abc", base_user()).await.unwrap();
        ProfileFlow::new(Arc::new(EchoProfiles), session)
            .save_address(mg_road())
            .await
            .unwrap();
    });

    let restored = runtime().block_on(async { open_session(&url).await.snapshot() });
    assert!(restored.is_authenticated);
    let user = restored.user.expect("user should be restored");
    assert_eq!(user.address().map(|a| a.street.as_str()), Some("12 MG Road"));

    let _ = std::fs::remove_file(&path);
}
