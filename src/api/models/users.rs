//! API models for users.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::users::User;
use crate::types::UserId;

/// The authenticated caller, as asserted by the trusted proxy header.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            is_admin: user.is_admin,
        }
    }
}
