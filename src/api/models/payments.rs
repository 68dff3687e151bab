//! API models for payment endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::bookings::BookingStatus;

/// Response of create-or-reuse: the secret the client needs to complete the
/// card flow. Repeated calls return the same secret.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Post-authorization callback body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

/// Callback result; also returned unchanged for idempotent re-deliveries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub status: BookingStatus,
}
