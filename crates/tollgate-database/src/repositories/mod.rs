//! Persistence contracts and their PostgreSQL implementations.
//!
//! Every aggregate is read, modified in memory, and written back whole.
//! `replace_user` is conditional on the version that was read, so two
//! concurrent read-modify-write cycles cannot both commit.

pub mod invitation;
pub mod organization;
pub mod user;

use async_trait::async_trait;

use tollgate_core::result::AppResult;
use tollgate_core::types::{OrganizationId, UserId};
use tollgate_entity::{InvitationToken, Organization, User};

pub use invitation::InvitationRepository;
pub use organization::OrganizationRepository;
pub use user::UserRepository;

/// User aggregate persistence.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by login email.
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by id.
    async fn get_user_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find the user whose collection contains `token`.
    async fn get_user_by_refresh_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Upsert the whole document.
    ///
    /// Succeeds only when the stored version still equals `user.version`
    /// (or the user does not exist yet); on success `user.version` is set
    /// to the new stored version. A stale version fails with `Conflict`.
    async fn replace_user(&self, user: &mut User) -> AppResult<()>;

    /// Insert a new user. A duplicate email fails with `Conflict`.
    async fn insert_user(&self, user: &mut User) -> AppResult<()>;
}

/// Organization lookups.
#[async_trait]
pub trait OrganizationStore: Send + Sync + 'static {
    /// Find an organization by id.
    async fn get_organization_by_id(&self, id: OrganizationId) -> AppResult<Option<Organization>>;

    /// Whether an organization with `id` exists.
    async fn organization_exists(&self, id: OrganizationId) -> AppResult<bool>;

    /// Insert a new organization.
    async fn insert_organization(&self, organization: &Organization) -> AppResult<()>;
}

/// Invitation persistence.
#[async_trait]
pub trait InvitationStore: Send + Sync + 'static {
    /// Every invitation of an organization, in creation order.
    async fn get_invitations_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<InvitationToken>>;

    /// Find an invitation by token.
    async fn get_invitation_by_token(&self, token: &str) -> AppResult<Option<InvitationToken>>;

    /// Insert a new invitation. A duplicate token fails with `Conflict`.
    async fn insert_invitation(&self, invitation: &InvitationToken) -> AppResult<()>;

    /// Overwrite an existing invitation. Returns `false` if it does not exist.
    async fn replace_invitation(&self, invitation: &InvitationToken) -> AppResult<bool>;

    /// Flip a pending invitation to accepted.
    ///
    /// Returns `true` only for the single caller that performed the
    /// transition; every later caller observes `false`.
    async fn try_accept_invitation(&self, token: &str) -> AppResult<bool>;

    /// Hard-delete an invitation. Returns `true` if a record was removed.
    async fn delete_invitation_by_token(&self, token: &str) -> AppResult<bool>;
}
