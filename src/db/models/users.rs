//! Database models for users.
//!
//! Users back gym owners and platform admins. Guests book without a row here;
//! their identity lives on the booking itself.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::UserId;

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub is_admin: Option<bool>,
}

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub email: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            email: None,
            skip,
            limit,
        }
    }
}
