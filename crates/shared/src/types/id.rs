//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ProjectId` where a `CriterionId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(ProjectId, "Unique identifier for a capital project (owned by the platform).");
typed_id!(CriterionId, "Unique identifier for a scoring criterion.");
typed_id!(ModelVersionId, "Unique identifier for a criteria model version.");
typed_id!(BudgetCycleId, "Unique identifier for a capital budget cycle.");
typed_id!(AllocationId, "Unique identifier for a budget allocation.");
typed_id!(AuditEntryId, "Unique identifier for an audit log row.");
typed_id!(GreenUpgradeId, "Unique identifier for a green upgrade record.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
