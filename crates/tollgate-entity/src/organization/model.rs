//! Organization entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::types::{OrganizationId, UserId};

use crate::user::Capability;

/// A tenant of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique organization identifier.
    pub id: OrganizationId,
    /// Display name, used in invitation messages.
    pub name: String,
    /// The user who owns the organization.
    pub owner_id: UserId,
    /// Capability-scoped membership.
    #[serde(default)]
    pub members: Vec<OrganizationMember>,
    /// When the organization was created.
    pub created_at: DateTime<Utc>,
}

/// One member and the capabilities it holds within the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMember {
    pub user_id: UserId,
    pub capabilities: BTreeSet<Capability>,
}

impl Organization {
    /// Create an organization whose owner is its first `Admin` member.
    pub fn new(name: impl Into<String>, owner_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            owner_id,
            members: vec![OrganizationMember {
                user_id: owner_id,
                capabilities: Capability::Admin.expand(),
            }],
            created_at: now,
        }
    }
}
