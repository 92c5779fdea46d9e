//! In-memory store with the same semantics as the PostgreSQL repositories.
//!
//! Backs the test suite and any embedding that runs without PostgreSQL.
//! Each aggregate is cloned in and out, so callers never share references
//! with the stored copy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::types::{OrganizationId, UserId};
use tollgate_entity::{InvitationToken, Organization, User};

use crate::repositories::{InvitationStore, OrganizationStore, UserStore};

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<UserId, User>,
    organizations: HashMap<OrganizationId, Organization>,
    /// Invitations in insertion order.
    invitations: Vec<InvitationToken>,
}

/// Single-process implementation of every store contract.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<InnerState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored invitations, across all organizations.
    pub async fn invitation_count(&self) -> usize {
        self.state.read().await.invitations.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_refresh_token(&self, token: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.refresh_token(token).is_some())
            .cloned())
    }

    async fn replace_user(&self, user: &mut User) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored_version = state.users.get(&user.id).map(|u| u.version);

        if let Some(stored) = stored_version {
            if stored != user.version {
                return Err(AppError::conflict(format!(
                    "User {} was modified concurrently (expected version {}, found {stored})",
                    user.id, user.version
                )));
            }
        }

        user.version += 1;
        debug!(user_id = %user.id, version = user.version, "User replaced");
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_user(&self, user: &mut User) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.id == user.id || u.email == user.email)
        {
            return Err(AppError::conflict(format!(
                "A user with email '{}' already exists",
                user.email
            )));
        }
        user.version = 1;
        state.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn get_organization_by_id(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn organization_exists(&self, id: OrganizationId) -> AppResult<bool> {
        Ok(self.state.read().await.organizations.contains_key(&id))
    }

    async fn insert_organization(&self, organization: &Organization) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.organizations.contains_key(&organization.id) {
            return Err(AppError::conflict(format!(
                "Organization {} already exists",
                organization.id
            )));
        }
        state
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn get_invitations_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<InvitationToken>> {
        let state = self.state.read().await;
        Ok(state
            .invitations
            .iter()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn get_invitation_by_token(&self, token: &str) -> AppResult<Option<InvitationToken>> {
        let state = self.state.read().await;
        Ok(state.invitations.iter().find(|i| i.token == token).cloned())
    }

    async fn insert_invitation(&self, invitation: &InvitationToken) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.invitations.iter().any(|i| i.token == invitation.token) {
            return Err(AppError::conflict("Invitation token already exists"));
        }
        state.invitations.push(invitation.clone());
        Ok(())
    }

    async fn replace_invitation(&self, invitation: &InvitationToken) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state
            .invitations
            .iter_mut()
            .find(|i| i.token == invitation.token)
        {
            Some(stored) => {
                *stored = invitation.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn try_accept_invitation(&self, token: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state
            .invitations
            .iter_mut()
            .find(|i| i.token == token && !i.accepted)
        {
            Some(stored) => {
                stored.accepted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_invitation_by_token(&self, token: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.invitations.len();
        state.invitations.retain(|i| i.token != token);
        Ok(state.invitations.len() < before)
    }
}
