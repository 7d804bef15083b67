//! Caller identity stamped onto scores, audit rows and allocations.
//!
//! The request-handling tier authenticates the user and hands the engine an
//! [`Actor`]; the engine only consults the role for admin-only operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Role of the caller within the assessment platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Capital planning manager.
    Manager,
    /// Field assessor who scores projects.
    Assessor,
    /// Read-only user.
    Viewer,
    /// The engine itself (auto-provisioning, auto-scoring).
    System,
}

impl Role {
    /// Returns the canonical string form of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Assessor => "assessor",
            Self::Viewer => "viewer",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "assessor" => Ok(Self::Assessor),
            "viewer" => Ok(Self::Viewer),
            "system" => Ok(Self::System),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User performing the operation.
    pub user_id: UserId,
    /// User's role.
    pub role: Role,
}

impl Actor {
    /// Creates a new actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// The engine acting on its own behalf. Uses the nil user id.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            user_id: UserId::from_uuid(Uuid::nil()),
            role: Role::System,
        }
    }

    /// Global criteria templates, permanent deletion and model versions.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::System)
    }

    /// Editing criteria and budget cycles.
    #[must_use]
    pub const fn can_manage(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager | Role::System)
    }

    /// Writing project scores.
    #[must_use]
    pub const fn can_score(&self) -> bool {
        !matches!(self.role, Role::Viewer)
    }
}
