//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `UserId` where a
//! `ProjectId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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
    };
}

typed_id!(UserId, "Unique identifier for a user account.");
typed_id!(ProjectId, "Unique identifier for a project (cost center).");
typed_id!(ExpenseId, "Unique identifier for an expense record.");
typed_id!(AllocationId, "Unique identifier for an allocation (viatico).");
typed_id!(InvoiceId, "Unique identifier for a pre-invoice.");
typed_id!(
    SplitGroupId,
    "Identifier linking sibling expenses created from one split submission."
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_ids_are_unique() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_v7_ids_are_time_ordered() {
        let a = ExpenseId::new();
        let b = ExpenseId::new();
        assert!(a <= b);
    }

    #[test]
    fn test_roundtrip_through_uuid() {
        let id = ProjectId::new();
        let uuid = id.into_inner();
        assert_eq!(ProjectId::from_uuid(uuid), id);
    }

    #[test]
    fn test_display_and_parse() {
        let id = AllocationId::new();
        let parsed = AllocationId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(InvoiceId::from_str("not-a-uuid").is_err());
    }
}
