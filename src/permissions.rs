use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::{User, UserRole},
};

/// Capability check shared by every mutating resource operation.
///
/// Role is checked before ownership: an admin may act on any resource as
/// if they were its author. Otherwise access is granted only when the
/// stored author reference equals the requester's identity.
///
/// Failure is always 403, never 404: callers resolve the resource first,
/// so a denied mutation reveals nothing beyond what retrieve already
/// exposes.
pub fn author_or_admin(user: &User, author_id: Uuid) -> Result<(), HttpError> {
    if user.role == UserRole::Admin {
        return Ok(());
    }

    if user.id == author_id {
        return Ok(());
    }

    Err(HttpError::forbidden(
        ErrorMessage::PermissionDenied.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@test.ru".to_string(),
            first_name: "R".to_string(),
            last_name: "T".to_string(),
            phone: None,
            role,
            avatar: None,
            password: "hash".to_string(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn author_may_mutate_own_resource() {
        let user = user_with_role(UserRole::User);
        assert!(author_or_admin(&user, user.id).is_ok());
    }

    #[test]
    fn non_author_is_forbidden() {
        let user = user_with_role(UserRole::User);
        let err = author_or_admin(&user, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = user_with_role(UserRole::Admin);
        assert!(author_or_admin(&admin, Uuid::new_v4()).is_ok());
    }
}
