//! Database models for booking access tokens.
//!
//! A token is a capability granting temporary visibility of one booking to a
//! guest without an account. Only the SHA-256 hash of the raw token is ever
//! stored; the raw value is observable exactly once, at mint time.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{AccessTokenId, BookingId};

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct BookingAccessToken {
    pub id: AccessTokenId,
    pub booking_id: BookingId,
    pub token_hash: String,
    /// The address the token was issued to; used for correlation, not authorization
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub is_single_use: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BookingAccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Request for creating a booking access token
#[derive(Debug, Clone)]
pub struct AccessTokenCreateDBRequest {
    pub booking_id: BookingId,
    pub raw_token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub is_single_use: bool,
}
