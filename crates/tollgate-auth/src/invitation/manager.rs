//! Organization invitation tokens.

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use tracing::{error, info, warn};

use tollgate_core::RetryPolicy;
use tollgate_core::config::InvitationConfig;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::{Clock, Notifier};
use tollgate_core::types::OrganizationId;
use tollgate_database::{InvitationStore, OrganizationStore};
use tollgate_entity::{Capability, InvitationToken};

/// Result of a successful invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationLink {
    /// `base_link/token`, ready to send to the receiver.
    pub link: String,
    /// Name of the inviting organization.
    pub organization_name: String,
    /// The stored invitation.
    pub invitation: InvitationToken,
}

/// Issues, accepts, and purges invitation tokens.
#[derive(Clone)]
pub struct InvitationTokenManager {
    invitations: Arc<dyn InvitationStore>,
    organizations: Arc<dyn OrganizationStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: InvitationConfig,
    retry: RetryPolicy,
}

impl std::fmt::Debug for InvitationTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationTokenManager")
            .field("config", &self.config)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl InvitationTokenManager {
    pub fn new(
        invitations: Arc<dyn InvitationStore>,
        organizations: Arc<dyn OrganizationStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: InvitationConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            invitations,
            organizations,
            notifier,
            clock,
            config,
            retry,
        }
    }

    /// Create an invitation into `organization_id` granting `level` and
    /// everything below it.
    ///
    /// Fails `OrganizationNotFound` for an unknown organization and
    /// `AccessLevelForbidden` for an unrecognized level; nothing is stored
    /// in either case. Stale invitations of the organization are purged
    /// before the new one is inserted.
    pub async fn invite(
        &self,
        organization_id: OrganizationId,
        receiver_email: &str,
        level: &str,
    ) -> AppResult<InvitationLink> {
        let organization = self
            .retry
            .run("get_organization", || {
                self.organizations.get_organization_by_id(organization_id)
            })
            .await?
            .ok_or_else(|| {
                AppError::organization_not_found(format!(
                    "Organization {organization_id} does not exist"
                ))
            })?;

        let capabilities = level.parse::<Capability>()?.expand();

        self.purge(organization_id).await?;

        let capabilities = &capabilities;
        let invitation = self
            .retry
            .run("insert_invitation", move || async move {
                let token = self.unique_token().await?;
                let invitation = InvitationToken::new(
                    token,
                    organization_id,
                    receiver_email,
                    capabilities.clone(),
                    self.clock.now(),
                    Duration::days(self.config.token_ttl_days),
                    Duration::days(self.config.removal_days),
                );
                self.invitations.insert_invitation(&invitation).await?;
                Ok(invitation)
            })
            .await?;

        let link = format!(
            "{}/{}",
            self.config.base_link.trim_end_matches('/'),
            invitation.token
        );

        info!(
            organization_id = %organization_id,
            receiver = %receiver_email,
            level = %level,
            expires_at = %invitation.token_expiration_time,
            "Invitation created"
        );

        Ok(InvitationLink {
            link,
            organization_name: organization.name,
            invitation,
        })
    }

    /// Invite and deliver the link to the receiver.
    ///
    /// The invitation stays stored when delivery fails; the delivery error
    /// is returned to the caller.
    pub async fn send_invitation(
        &self,
        organization_id: OrganizationId,
        receiver_email: &str,
        level: &str,
    ) -> AppResult<InvitationLink> {
        let issued = self.invite(organization_id, receiver_email, level).await?;

        let subject = format!("You have been invited to join {}", issued.organization_name);
        let body = format!(
            "You have been invited to join {} on Tollgate.\n\n\
             Accept the invitation here: {}\n\n\
             This link expires at {}.",
            issued.organization_name, issued.link, issued.invitation.token_expiration_time
        );

        if let Err(e) = self
            .retry
            .run("send_invitation", || {
                self.notifier.send_message(receiver_email, &subject, &body)
            })
            .await
        {
            error!(
                organization_id = %organization_id,
                receiver = %receiver_email,
                error = %e,
                "Failed to deliver invitation"
            );
            return Err(e);
        }

        Ok(issued)
    }

    /// Hard-delete invitations of `organization_id` whose removal date has
    /// passed. Returns the number deleted.
    pub async fn purge(&self, organization_id: OrganizationId) -> AppResult<usize> {
        let now = self.clock.now();
        let stale: Vec<InvitationToken> = self
            .retry
            .run("list_invitations", || {
                self.invitations.get_invitations_by_organization(organization_id)
            })
            .await?
            .into_iter()
            .filter(|i| i.is_removable_at(now))
            .collect();

        let mut deleted = 0;
        for invitation in &stale {
            let removed = self
                .retry
                .run("delete_invitation", || {
                    self.invitations.delete_invitation_by_token(&invitation.token)
                })
                .await?;
            if removed {
                deleted += 1;
            }
        }

        if deleted > 0 {
            info!(organization_id = %organization_id, deleted, "Stale invitations purged");
        }
        Ok(deleted)
    }

    /// Consume `token`.
    ///
    /// Checks run in order: unknown token (`InvitationTokenNotFound`), past
    /// its expiration time (`InvitationTokenExpired`), already accepted
    /// (`InvitationTokenAlreadyUsed`). Of concurrent callers only one can
    /// succeed.
    pub async fn accept(&self, token: &str) -> AppResult<InvitationToken> {
        let mut invitation = self.check(token).await?;

        let transitioned = self
            .retry
            .run("accept_invitation", || self.invitations.try_accept_invitation(token))
            .await?;
        if !transitioned {
            warn!(
                organization_id = %invitation.organization_id,
                "Invitation accepted concurrently by another request"
            );
            return Err(AppError::invitation_already_used(
                "Invitation token has already been used",
            ));
        }

        invitation.accepted = true;
        info!(
            organization_id = %invitation.organization_id,
            receiver = %invitation.receiver_email,
            "Invitation accepted"
        );
        Ok(invitation)
    }

    /// The stored invitation for `token` if it could still be accepted now.
    ///
    /// Fails like [`Self::accept`] but changes nothing.
    pub async fn check(&self, token: &str) -> AppResult<InvitationToken> {
        let invitation = self
            .retry
            .run("get_invitation", || self.invitations.get_invitation_by_token(token))
            .await?
            .ok_or_else(|| AppError::invitation_not_found("Invitation token not found"))?;

        if invitation.is_expired_at(self.clock.now()) {
            warn!(
                organization_id = %invitation.organization_id,
                expired_at = %invitation.token_expiration_time,
                "Expired invitation presented"
            );
            return Err(AppError::invitation_expired("Invitation token has expired"));
        }
        if invitation.accepted {
            return Err(AppError::invitation_already_used(
                "Invitation token has already been used",
            ));
        }
        Ok(invitation)
    }

    /// Return an accepted invitation to the pending state.
    ///
    /// Used when the work that consumed the invitation failed afterwards.
    pub async fn release(&self, invitation: &InvitationToken) -> AppResult<()> {
        let mut pending = invitation.clone();
        pending.accepted = false;
        let replaced = self
            .retry
            .run("release_invitation", || self.invitations.replace_invitation(&pending))
            .await?;
        if !replaced {
            return Err(AppError::invitation_not_found("Invitation token not found"));
        }

        info!(
            organization_id = %invitation.organization_id,
            receiver = %invitation.receiver_email,
            "Invitation released"
        );
        Ok(())
    }

    /// A random token not currently present in the store.
    async fn unique_token(&self) -> AppResult<String> {
        for attempt in 1..=self.config.max_generation_attempts {
            let token = generate_token(self.config.token_length);
            if self.invitations.get_invitation_by_token(&token).await?.is_none() {
                return Ok(token);
            }
            warn!(attempt, "Invitation token collision, regenerating");
        }
        Err(AppError::internal(format!(
            "Could not generate a unique invitation token in {} attempts",
            self.config.max_generation_attempts
        )))
    }
}

/// `length` characters drawn uniformly from `[A-Za-z0-9]` with the OS CSPRNG.
pub fn generate_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
