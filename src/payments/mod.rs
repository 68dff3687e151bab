//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts the
//! manual-capture authorization lifecycle a booking depends on: create a
//! hold, look it up again (for idempotent reuse), and release it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    config::PaymentConfig,
    db::models::{bookings::Booking, gyms::Gym},
};

pub mod dummy;
pub mod stripe;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Arc::new(stripe::StripeProvider::from_config(stripe_config)),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::from_config(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error("Payment authorization not found upstream")]
    AuthorizationNotFound,
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::InvalidData(_) => StatusCode::BAD_REQUEST,
            PaymentError::ProviderApi(_) | PaymentError::AuthorizationNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing text; processor details stay in the server-side logs.
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::InvalidData(message) => message.clone(),
            PaymentError::ProviderApi(_) | PaymentError::AuthorizationNotFound => {
                "Payment processing is temporarily unavailable".to_string()
            }
        }
    }
}

/// The state of one card-payment authorization upstream.
#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    /// Processor-side intent id, stored on the booking
    pub intent_id: String,
    /// Secret the client needs to complete the card flow
    pub client_secret: Option<String>,
    pub is_canceled: bool,
}

/// Abstract payment provider interface
///
/// All authorizations are manual capture: funds are held at authorization
/// time and only move when the external settlement process captures them.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a new authorization for `round(total_price * 100)` minor units
    /// in the gym's currency, tagged with booking/gym metadata for
    /// reconciliation.
    async fn create_authorization(&self, booking: &Booking, gym: &Gym) -> Result<PaymentAuthorization>;

    /// Retrieve an existing authorization. Used for idempotent reuse; a
    /// stale or foreign id fails with `AuthorizationNotFound`.
    async fn retrieve_authorization(&self, intent_id: &str) -> Result<PaymentAuthorization>;

    /// Cancel an authorization. Canceling one that is already canceled is a
    /// no-op, not a failure.
    async fn cancel_authorization(&self, intent_id: &str) -> Result<()>;
}

/// Convert a decimal price to processor minor units (cents).
///
/// Half-cent amounts round away from zero, the way payment totals are
/// conventionally rounded.
pub fn amount_minor_units(total_price: Decimal) -> Result<i64> {
    (total_price * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| PaymentError::InvalidData(format!("Booking total {total_price} cannot be represented in minor units")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_minor_units_rounds() {
        assert_eq!(amount_minor_units(Decimal::new(10000, 2)).unwrap(), 10000); // 100.00
        assert_eq!(amount_minor_units(Decimal::new(9999, 2)).unwrap(), 9999); // 99.99
        assert_eq!(amount_minor_units(Decimal::new(100005, 3)).unwrap(), 10001); // 100.005 rounds up
    }

    #[test]
    fn test_provider_errors_hide_processor_details() {
        let err = PaymentError::ProviderApi("stripe said: invalid api key sk_live_xyz".to_string());
        assert!(!err.user_message().contains("sk_live"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
