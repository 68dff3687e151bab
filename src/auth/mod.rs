//! Authentication and authorization primitives.
//!
//! Login sessions are out of scope: a trusted SSO proxy in front of the
//! service asserts the caller's identity in a request header, and
//! [`CurrentUser`](crate::api::models::users::CurrentUser) is extracted from
//! it. Guests simply present no header.
//!
//! [`Actor`] is the explicit trust boundary for operations that legitimately
//! cross user-level access control (payment callbacks, webhook delivery):
//! `Actor::System` is constructed deliberately at those entry points, never
//! held as an ambient privileged handle.

pub mod current_user;

use crate::{
    api::models::users::CurrentUser,
    db::models::gyms::Gym,
    errors::{Error, Result},
    types::Operation,
};

/// Who is driving a lifecycle transition.
#[derive(Debug, Clone)]
pub enum Actor {
    /// An authenticated end user
    User(CurrentUser),
    /// The service itself, at an internal trust boundary
    System,
}

impl Actor {
    /// Whether this actor may manage bookings of `gym` (accept, decline,
    /// cancel, read).
    pub fn can_manage_gym(&self, gym: &Gym) -> bool {
        match self {
            Actor::System => true,
            Actor::User(user) => user.is_admin || user.id == gym.owner_id,
        }
    }
}

/// Require that `actor` may manage bookings of `gym`, failing with Forbidden
/// otherwise.
pub fn authorize_gym_action(actor: &Actor, gym: &Gym, action: Operation) -> Result<()> {
    if actor.can_manage_gym(gym) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action,
            resource: format!("bookings of gym '{}'", gym.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn gym_owned_by(owner_id: Uuid) -> Gym {
        Gym {
            id: Uuid::new_v4(),
            owner_id,
            name: "Test Gym".to_string(),
            city: "Phuket".to_string(),
            country: "TH".to_string(),
            currency: "usd".to_string(),
            is_verified: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(id: Uuid, is_admin: bool) -> CurrentUser {
        CurrentUser {
            id,
            email: "user@example.com".to_string(),
            display_name: None,
            is_admin,
        }
    }

    #[test]
    fn test_owner_admin_and_system_may_manage() {
        let owner_id = Uuid::new_v4();
        let gym = gym_owned_by(owner_id);

        assert!(Actor::User(user(owner_id, false)).can_manage_gym(&gym));
        assert!(Actor::User(user(Uuid::new_v4(), true)).can_manage_gym(&gym));
        assert!(Actor::System.can_manage_gym(&gym));
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let gym = gym_owned_by(Uuid::new_v4());
        let actor = Actor::User(user(Uuid::new_v4(), false));

        let err = authorize_gym_action(&actor, &gym, Operation::Accept).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
