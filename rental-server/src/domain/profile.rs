use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Renter,
    Lessor,
    Admin,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Role::Renter => "renter",
            Role::Lessor => "lessor",
            Role::Admin => "admin",
        }
    }

    pub(crate) fn can_publish(self) -> bool {
        matches!(self, Role::Lessor | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "renter" => Ok(Role::Renter),
            "lessor" => Ok(Role::Lessor),
            "admin" => Ok(Role::Admin),
            _ => Err(DomainError::invalid("role", "unknown role")),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Lock {
    pub(crate) locked_at: DateTime<Utc>,
    pub(crate) locked_by: i64,
}

/// Account record owned by this service; `auth_user_id` points at the identity
/// provider's user.
#[derive(Debug, Clone)]
pub(crate) struct Profile {
    pub(crate) id: i64,
    pub(crate) auth_user_id: Uuid,
    pub(crate) display_name: String,
    pub(crate) phone: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) role: Role,
    pub(crate) lock: Option<Lock>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Profile {
    pub(crate) fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}

pub(crate) fn validate_profile_id(id: i64) -> Result<i64, DomainError> {
    if id <= 0 {
        return Err(DomainError::invalid("id", "must be > 0"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn only_lessors_and_admins_publish() {
        assert!(!Role::Renter.can_publish());
        assert!(Role::Lessor.can_publish());
        assert!(Role::Admin.can_publish());
    }

    #[test]
    fn role_parses_from_lowercase_name() {
        assert_eq!("admin".parse::<Role>().expect("admin"), Role::Admin);
        assert!("Admin".parse::<Role>().is_err());
    }
}
