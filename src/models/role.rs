//! Roles: a closed set of three canonical roles.

use serde::{Deserialize, Serialize};

/// The fixed role enumeration. New users always get [`RoleName::User`];
/// the other two exist for future role management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleName {
    User,
    Admin,
    Moderator,
}

impl RoleName {
    /// All canonical roles, in bootstrap order.
    pub const CANONICAL: [RoleName; 3] = [RoleName::User, RoleName::Admin, RoleName::Moderator];

    /// The authority string embedded in tokens and responses.
    pub fn as_authority(self) -> &'static str {
        match self {
            RoleName::User => "ROLE_USER",
            RoleName::Admin => "ROLE_ADMIN",
            RoleName::Moderator => "ROLE_MODERATOR",
        }
    }

    /// Parse the stored role name back into the enum. Returns `None` for
    /// strings outside the canonical set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ROLE_USER" => Some(RoleName::User),
            "ROLE_ADMIN" => Some(RoleName::Admin),
            "ROLE_MODERATOR" => Some(RoleName::Moderator),
            _ => None,
        }
    }

    /// Fixed description used when the bootstrap step creates the role row.
    pub fn description(self) -> &'static str {
        match self {
            RoleName::User => "Default role for all users",
            RoleName::Admin => "Administrator role with full access",
            RoleName::Moderator => "Moderator role with limited admin access",
        }
    }
}
