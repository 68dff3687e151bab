//! Database models for gyms (training camps).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{GymId, UserId};

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Gym {
    pub id: GymId,
    pub owner_id: UserId,
    pub name: String,
    pub city: String,
    pub country: String,
    /// ISO 4217 currency code, lowercase (what the payment processor expects)
    pub currency: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gym {
    /// Whether the gym is allowed to take new bookings.
    pub fn accepts_bookings(&self) -> bool {
        self.is_verified && self.is_active
    }
}

/// Database request for creating a gym
#[derive(Debug, Clone)]
pub struct GymCreateDBRequest {
    pub owner_id: UserId,
    pub name: String,
    pub city: String,
    pub country: String,
    pub currency: String,
    pub is_verified: bool,
    pub is_active: bool,
}

/// Database request for updating a gym
#[derive(Debug, Clone, Default)]
pub struct GymUpdateDBRequest {
    pub name: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
}

/// Filter for listing gyms
#[derive(Debug, Clone)]
pub struct GymFilter {
    pub owner_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

impl GymFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            owner_id: None,
            skip,
            limit,
        }
    }
}
