//! Common type definitions shared across the crate.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`UserId`]: account identifier (gym owners, admins, returning guests)
//! - [`GymId`]: training camp identifier
//! - [`BookingId`]: booking identifier
//! - [`PackageId`] / [`PackageVariantId`]: pricing configuration identifiers
//! - [`AccessTokenId`]: booking access token identifier
//!
//! The [`Operation`] enum names the action in authorization failures so error
//! messages stay consistent across handlers.

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type GymId = Uuid;
pub type BookingId = Uuid;
pub type PackageId = Uuid;
pub type PackageVariantId = Uuid;
pub type AccessTokenId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Actions that can be denied by an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Cancel,
    Accept,
    Decline,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Cancel => write!(f, "cancel"),
            Operation::Accept => write!(f, "accept"),
            Operation::Decline => write!(f, "decline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let uuid: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(abbrev_uuid(&uuid), "550e8400");
    }
}
