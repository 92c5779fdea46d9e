//! Login, refresh, logout, and the capability guard end to end.

mod helpers;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Duration;

use helpers::{CLIENT_IP, PASSWORD, TestApp};
use tollgate_auth::{authorize, require_any};
use tollgate_core::ErrorKind;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::Clock;
use tollgate_core::types::UserId;
use tollgate_database::{MemoryStore, UserStore};
use tollgate_entity::{Capability, User};

/// Fails the first `failures` replaces and the first `insert_failures`
/// inserts with `kind`, then delegates.
#[derive(Debug)]
struct FlakyUsers {
    inner: MemoryStore,
    failures: AtomicU32,
    insert_failures: AtomicU32,
    kind: ErrorKind,
}

#[async_trait]
impl UserStore for FlakyUsers {
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.inner.get_user_by_email(email).await
    }

    async fn get_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.inner.get_user_by_id(id).await
    }

    async fn get_user_by_refresh_token(&self, token: &str) -> AppResult<Option<User>> {
        self.inner.get_user_by_refresh_token(token).await
    }

    async fn replace_user(&self, user: &mut User) -> AppResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::new(self.kind, "injected failure"));
        }
        self.inner.replace_user(user).await
    }

    async fn insert_user(&self, user: &mut User) -> AppResult<()> {
        let remaining = self.insert_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.insert_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::new(self.kind, "injected failure"));
        }
        self.inner.insert_user(user).await
    }
}

fn flaky_app(failures: u32, kind: ErrorKind) -> TestApp {
    flaky_app_with_inserts(failures, 0, kind)
}

fn flaky_app_with_inserts(failures: u32, insert_failures: u32, kind: ErrorKind) -> TestApp {
    let store = MemoryStore::new();
    let users = Arc::new(FlakyUsers {
        inner: store.clone(),
        failures: AtomicU32::new(failures),
        insert_failures: AtomicU32::new(insert_failures),
        kind,
    });
    TestApp::with_user_store(store, users)
}

#[tokio::test]
async fn test_login_issues_both_tokens() {
    let app = TestApp::new();
    let user_id = app.create_user("user@example.com", Capability::Editor).await;
    let now = app.clock.now();

    let response = app
        .sessions
        .login("user@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap();

    assert_eq!(response.user.id, user_id);
    assert_eq!(response.access_expires_at, now + Duration::minutes(30));
    assert_eq!(response.refresh_expires_at, now + Duration::days(7));

    let identity = app.issuer.validate(&response.access_token).unwrap();
    assert_eq!(identity.user_id, user_id);
    assert_eq!(identity.capabilities, Capability::Editor.expand());

    let user = app.user(user_id).await;
    let record = user.refresh_token(&response.refresh_token).unwrap();
    assert_eq!(record.created_by_ip, CLIENT_IP.to_string());
}

#[tokio::test]
async fn test_refresh_picks_up_capability_changes() {
    let app = TestApp::new();
    let user_id = app.create_user("promo@example.com", Capability::Viewer).await;
    let login = app
        .sessions
        .login("promo@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap();

    let mut user = app.user(user_id).await;
    user.capabilities = Capability::Admin.expand();
    app.store.replace_user(&mut user).await.unwrap();

    app.clock.advance(Duration::minutes(10));
    let refreshed = app
        .sessions
        .refresh(&login.refresh_token, CLIENT_IP)
        .await
        .unwrap();

    let identity = app.issuer.validate(&refreshed.access_token).unwrap();
    assert!(identity.capabilities.contains(&Capability::Admin));
    assert_eq!(refreshed.user.capabilities, Capability::Admin.expand());
    assert_eq!(
        refreshed.access_expires_at,
        app.clock.now() + Duration::minutes(30)
    );
}

#[tokio::test]
async fn test_access_token_expires_after_thirty_minutes() {
    let app = TestApp::new();
    app.create_user("short@example.com", Capability::Viewer).await;
    let login = app
        .sessions
        .login("short@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap();

    app.clock.advance(Duration::minutes(30));
    assert!(app.issuer.validate(&login.access_token).is_none());

    // The refresh token still works and yields a valid access token.
    let refreshed = app
        .sessions
        .refresh(&login.refresh_token, CLIENT_IP)
        .await
        .unwrap();
    assert!(app.issuer.validate(&refreshed.access_token).is_some());
}

#[tokio::test]
async fn test_logout_revokes_once() {
    let app = TestApp::new();
    let user_id = app.create_user("bye@example.com", Capability::Viewer).await;
    let login = app
        .sessions
        .login("bye@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap();

    app.sessions.logout(&login.refresh_token, CLIENT_IP).await.unwrap();
    let user = app.user(user_id).await;
    let record = user.refresh_token(&login.refresh_token).unwrap();
    assert_eq!(
        record.revocation_reason.as_deref(),
        Some("Revoked without replacement")
    );
    assert!(record.replaced_by_token.is_none());

    let err = app
        .sessions
        .logout(&login.refresh_token, CLIENT_IP)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_guard_uses_token_capabilities() {
    let app = TestApp::new();
    app.create_user("editor@example.com", Capability::Editor).await;
    let login = app
        .sessions
        .login("editor@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap();
    let held = app.issuer.validate(&login.access_token).unwrap().capabilities;

    assert!(authorize(&BTreeSet::from([Capability::Editor]), &held));
    assert!(authorize(&BTreeSet::new(), &held));
    assert!(!authorize(&BTreeSet::from([Capability::Admin]), &held));
    assert_eq!(
        require_any(&BTreeSet::from([Capability::Admin]), &held)
            .unwrap_err()
            .kind,
        ErrorKind::Authorization
    );
}

#[tokio::test]
async fn test_stale_write_is_retried_once() {
    let app = flaky_app(1, ErrorKind::Conflict);
    app.create_user("retry@example.com", Capability::Viewer).await;

    let login = app
        .sessions
        .login("retry@example.com", PASSWORD, CLIENT_IP)
        .await;
    assert!(login.is_ok());
}

#[tokio::test]
async fn test_repeated_conflict_is_surfaced() {
    let app = flaky_app(2, ErrorKind::Conflict);
    app.create_user("stale@example.com", Capability::Viewer).await;

    let err = app
        .sessions
        .login("stale@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_database_failure_propagates_after_budget() {
    let app = flaky_app(10, ErrorKind::Database);
    let user_id = app.create_user("down@example.com", Capability::Viewer).await;

    let err = app
        .sessions
        .login("down@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
    assert!(app.user(user_id).await.refresh_tokens.is_empty());
}

#[tokio::test]
async fn test_failed_invited_registration_releases_invitation() {
    let app = flaky_app_with_inserts(0, 1, ErrorKind::Database);
    let org = app.create_organization("Acme").await;
    let token = app
        .invitations
        .invite(org, "joiner@example.com", "Editor")
        .await
        .unwrap()
        .invitation
        .token;

    let err = app.sessions.register_invited(&token, "pw").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
    assert!(app.store.get_user_by_email("joiner@example.com").await.unwrap().is_none());

    let summary = app.sessions.register_invited(&token, "pw").await.unwrap();
    assert_eq!(summary.capabilities, Capability::Editor.expand());
}
