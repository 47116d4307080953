//! Database models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of account roles. Stored as TEXT in the `users` table;
/// unknown values degrade to the least-privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub fn parse(raw: &str) -> Role {
        match raw {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

/// User account row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub confirmed: bool,
    pub avatar: String,
    /// Last issued refresh token; compared on every refresh exchange and
    /// overwritten on rotation. NULL means no valid refresh token exists.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Contact row, owned by exactly one user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    /// Calendar date stored as text in `YYYY-MM-DD`.
    pub birthday: String,
    pub additional_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_known_values() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("moderator"), Role::Moderator);
        assert_eq!(Role::parse("user"), Role::User);
    }

    #[test]
    fn test_role_parse_unknown_defaults_to_user() {
        assert_eq!(Role::parse("superuser"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Admin, Role::Moderator, Role::User] {
            assert_eq!(Role::parse(role.as_str()), role);
        }
    }
}
