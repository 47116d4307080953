//! Role policy: fixed allow-lists per operation, checked explicitly at the
//! top of each handler after the bearer token has been validated.

use crate::db::models::Role;
use crate::errors::ApiError;

/// Read operations: every authenticated role.
pub const READ_ROLES: &[Role] = &[Role::Admin, Role::Moderator, Role::User];

/// Create and update operations.
pub const MODIFY_ROLES: &[Role] = &[Role::Admin, Role::Moderator];

/// Delete operations.
pub const DELETE_ROLES: &[Role] = &[Role::Admin];

/// Deny unless the requester's role appears in the operation's allow-list.
pub fn authorize(allowed: &[Role], role: Role) -> Result<(), ApiError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_allows_every_role() {
        for role in [Role::Admin, Role::Moderator, Role::User] {
            assert!(authorize(READ_ROLES, role).is_ok());
        }
    }

    #[test]
    fn test_modify_denies_plain_user() {
        assert!(authorize(MODIFY_ROLES, Role::Admin).is_ok());
        assert!(authorize(MODIFY_ROLES, Role::Moderator).is_ok());
        assert!(matches!(
            authorize(MODIFY_ROLES, Role::User),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_delete_is_admin_only() {
        assert!(authorize(DELETE_ROLES, Role::Admin).is_ok());
        assert!(matches!(
            authorize(DELETE_ROLES, Role::Moderator),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            authorize(DELETE_ROLES, Role::User),
            Err(ApiError::Forbidden)
        ));
    }
}
