//! Shared test helpers for integration tests.
//!
//! Everything runs against the in-memory store and a manual clock, so no
//! database is required.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use tollgate_auth::{
    AccessTokenIssuer, CredentialHasher, InvitationTokenManager, RefreshTokenChain, SessionManager,
};
use tollgate_core::RetryPolicy;
use tollgate_core::config::{AppConfig, RetryConfig};
use tollgate_core::traits::{Clock, ManualClock};
use tollgate_core::types::{OrganizationId, UserId};
use tollgate_database::{MemoryStore, OrganizationStore, UserStore};
use tollgate_entity::{Capability, Organization, User};
use tollgate_notify::RecordingNotifier;

pub const CLIENT_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
pub const PASSWORD: &str = "correct horse battery staple";

/// Test application context
pub struct TestApp {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub notifier: RecordingNotifier,
    pub config: AppConfig,
    pub issuer: Arc<AccessTokenIssuer>,
    pub chain: Arc<RefreshTokenChain>,
    pub invitations: Arc<InvitationTokenManager>,
    pub sessions: SessionManager,
}

/// Retries with millisecond backoff so tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::from(&RetryConfig {
        max_retries: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        backoff_multiplier: 2.0,
        jitter: false,
        attempt_timeout_ms: 1_000,
    })
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let store = MemoryStore::new();
        Self::with_user_store(store.clone(), Arc::new(store))
    }

    /// Create an application whose user persistence goes through `users`.
    pub fn with_user_store(store: MemoryStore, users: Arc<dyn UserStore>) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".into();
        config.invitation.base_link = "https://app.example.com/invite".into();
        config.auth.validate().expect("valid auth config");
        config.invitation.validate().expect("valid invitation config");

        let clock = ManualClock::default();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let notifier = RecordingNotifier::new();

        let issuer = Arc::new(AccessTokenIssuer::new(&config.auth, shared_clock.clone()));
        let chain = Arc::new(RefreshTokenChain::new(
            users.clone(),
            shared_clock.clone(),
            &config.auth,
            fast_retry(),
        ));
        let invitations = Arc::new(InvitationTokenManager::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
            shared_clock.clone(),
            config.invitation.clone(),
            fast_retry(),
        ));
        let sessions = SessionManager::new(
            users,
            Arc::new(CredentialHasher::new(config.auth.password_algorithm)),
            issuer.clone(),
            chain.clone(),
            invitations.clone(),
            shared_clock,
            fast_retry(),
        );

        Self {
            store,
            clock,
            notifier,
            config,
            issuer,
            chain,
            invitations,
            sessions,
        }
    }

    /// Register a user with `PASSWORD` and the capabilities implied by `level`.
    pub async fn create_user(&self, email: &str, level: Capability) -> UserId {
        self.sessions
            .register(email, PASSWORD, level.expand())
            .await
            .expect("Failed to register user")
            .id
    }

    /// Insert an organization owned by a fresh user.
    pub async fn create_organization(&self, name: &str) -> OrganizationId {
        let organization = Organization::new(name, UserId::new(), self.clock.now());
        self.store
            .insert_organization(&organization)
            .await
            .expect("Failed to insert organization");
        organization.id
    }

    /// Current stored state of a user.
    pub async fn user(&self, id: UserId) -> User {
        self.store
            .get_user_by_id(id)
            .await
            .expect("Failed to load user")
            .expect("User not found")
    }
}
