use std::collections::BTreeSet;

use catalog_authz::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::validation::FieldErrors;

/// A registered user as listed to staff. The password hash never leaves the
/// repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
    pub permissions: BTreeSet<Permission>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl NewUser {
    /// Check the fields and resolve permission codes.
    pub fn validate(&self) -> Result<BTreeSet<Permission>, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.required("username", &self.username);
        errors.max_chars("username", &self.username, 150);
        if !self.username.chars().all(is_username_char) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        errors.required("password", &self.password);

        let mut permissions = BTreeSet::new();
        for code in &self.permissions {
            match code.parse::<Permission>() {
                Ok(permission) => {
                    permissions.insert(permission);
                }
                Err(e) => errors.add("permissions", e.to_string()),
            }
        }

        if errors.is_empty() {
            Ok(permissions)
        } else {
            Err(errors)
        }
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}
