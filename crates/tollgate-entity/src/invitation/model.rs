//! Invitation token entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tollgate_core::types::OrganizationId;

use crate::user::Capability;

/// Derived lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Can still be accepted.
    Pending,
    /// Accepted once; terminal.
    Accepted,
    /// Never accepted and past its token expiration time.
    Expired,
}

/// A single-use invitation into an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InvitationToken {
    /// Opaque alphanumeric token, also the primary key.
    pub token: String,
    /// Organization the receiver is invited into.
    pub organization_id: OrganizationId,
    /// Address the invitation was sent to.
    pub receiver_email: String,
    /// Capabilities granted on acceptance (already expanded).
    #[sqlx(json)]
    pub capabilities: BTreeSet<Capability>,
    /// Whether the token has been used.
    pub accepted: bool,
    /// When the invitation was created.
    pub created_at: DateTime<Utc>,
    /// After this instant the token can no longer be accepted.
    pub token_expiration_time: DateTime<Utc>,
    /// At or after this instant a purge deletes the record.
    pub remove_from_db_date: DateTime<Utc>,
}

impl InvitationToken {
    /// Build a pending invitation created at `now`.
    pub fn new(
        token: String,
        organization_id: OrganizationId,
        receiver_email: impl Into<String>,
        capabilities: BTreeSet<Capability>,
        now: DateTime<Utc>,
        token_ttl: Duration,
        removal_after: Duration,
    ) -> Self {
        Self {
            token,
            organization_id,
            receiver_email: receiver_email.into(),
            capabilities,
            accepted: false,
            created_at: now,
            token_expiration_time: now + token_ttl,
            remove_from_db_date: now + removal_after,
        }
    }

    /// Whether the acceptance window has closed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.token_expiration_time
    }

    /// Whether a purge at `now` deletes this record.
    pub fn is_removable_at(&self, now: DateTime<Utc>) -> bool {
        self.remove_from_db_date <= now
    }

    /// The derived state at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.accepted {
            InvitationStatus::Accepted
        } else if self.is_expired_at(now) {
            InvitationStatus::Expired
        } else {
            InvitationStatus::Pending
        }
    }
}
