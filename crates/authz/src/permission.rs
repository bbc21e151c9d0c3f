use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),
}

/// Named permissions that can be granted to individual users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Set book as returned; also gates loan renewals.
    #[serde(rename = "catalog.can_mark_returned")]
    CanMarkReturned,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[Permission::CanMarkReturned];

    pub fn code(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "catalog.can_mark_returned",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "Set book as returned",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Permission {
    type Err = AuthError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.code() == code)
            .ok_or_else(|| AuthError::UnknownPermission(code.to_string()))
    }
}

/// The authenticated user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub is_staff: bool,
    pub permissions: BTreeSet<Permission>,
}

impl Principal {
    /// Staff users hold every permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_staff || self.permissions.contains(&permission)
    }
}
