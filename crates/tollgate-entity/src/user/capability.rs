//! Capability (access level) enumeration.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access levels granted to a user.
///
/// Grants are cumulative: `Admin ⊇ Editor ⊇ Viewer`. The derived ordering
/// follows privilege, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Read-only access.
    Viewer,
    /// May modify organization content.
    Editor,
    /// Full control of the organization.
    Admin,
}

impl Capability {
    /// All capabilities, lowest privilege first.
    pub const ALL: [Capability; 3] = [Self::Viewer, Self::Editor, Self::Admin];

    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Editor => 2,
            Self::Viewer => 1,
        }
    }

    /// The cumulative grant implied by this level: itself and every lower level.
    pub fn expand(self) -> BTreeSet<Capability> {
        Self::ALL
            .into_iter()
            .filter(|c| c.privilege_level() <= self.privilege_level())
            .collect()
    }

    /// Return the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Editor => "Editor",
            Self::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = tollgate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(tollgate_core::AppError::access_level_forbidden(format!(
                "Unknown access level '{s}'. Expected one of: Admin, Editor, Viewer"
            ))),
        }
    }
}
