//! API models for booking access tokens and guest self-service lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::BookingId;

use super::bookings::{BookingResponse, PackageSummary, PackageVariantSummary};
use super::gyms::GymSummary;

/// Request body for minting an access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MintAccessTokenRequest {
    /// Must match the booking's stored guest email (case-insensitive)
    pub email: String,
    /// Defaults to long-lived, reusable tokens
    #[serde(default)]
    pub single_use: bool,
    /// Override the configured validity window
    pub expires_in_days: Option<i64>,
}

/// The raw token, observable exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// What a valid token grants.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessDescriptorResponse {
    #[schema(value_type = String, format = "uuid")]
    pub booking_id: BookingId,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Request body for reference + PIN lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GuestAccessRequest {
    pub booking_reference: String,
    pub booking_pin: String,
}

/// Reference + PIN lookup result: the booking joined with its gym and
/// pricing configuration. The PIN is structurally absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GuestAccessResponse {
    pub booking: BookingResponse,
    pub gym: GymSummary,
    pub package: Option<PackageSummary>,
    pub package_variant: Option<PackageVariantSummary>,
}

/// Request body for the recovery-link flow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestAccessRequest {
    pub booking_reference: String,
    pub email: String,
}

/// Deliberately identical for hits and misses, to resist enumeration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestAccessResponse {
    pub success: bool,
    pub message: String,
}
