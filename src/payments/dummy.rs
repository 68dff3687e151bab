//! Dummy payment provider implementation
//!
//! Authorizations live in process memory and are always immediately "held".
//! Useful for development and tests; never use in production.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    config::DummyConfig,
    db::models::{bookings::Booking, gyms::Gym},
    payments::{PaymentAuthorization, PaymentError, PaymentProvider, Result, amount_minor_units},
};

#[derive(Debug, Clone)]
struct DummyIntent {
    client_secret: String,
    is_canceled: bool,
}

/// In-memory payment provider
#[derive(Default)]
pub struct DummyProvider {
    intents: DashMap<String, DummyIntent>,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(_config: DummyConfig) -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn create_authorization(&self, booking: &Booking, gym: &Gym) -> Result<PaymentAuthorization> {
        // Validates the same inputs the real provider would
        let amount = amount_minor_units(booking.total_price)?;
        if gym.currency.len() != 3 {
            return Err(PaymentError::InvalidData(format!("Unsupported currency '{}'", gym.currency)));
        }

        let intent_id = format!("pi_dummy_{}", Uuid::new_v4().simple());
        let client_secret = format!("{}_secret_{}", intent_id, Uuid::new_v4().simple());

        self.intents.insert(
            intent_id.clone(),
            DummyIntent {
                client_secret: client_secret.clone(),
                is_canceled: false,
            },
        );

        tracing::info!(
            "Dummy provider created intent {} for booking {} ({} minor units)",
            intent_id,
            booking.booking_reference,
            amount
        );

        Ok(PaymentAuthorization {
            intent_id,
            client_secret: Some(client_secret),
            is_canceled: false,
        })
    }

    async fn retrieve_authorization(&self, intent_id: &str) -> Result<PaymentAuthorization> {
        let intent = self.intents.get(intent_id).ok_or(PaymentError::AuthorizationNotFound)?;

        Ok(PaymentAuthorization {
            intent_id: intent_id.to_string(),
            client_secret: Some(intent.client_secret.clone()),
            is_canceled: intent.is_canceled,
        })
    }

    async fn cancel_authorization(&self, intent_id: &str) -> Result<()> {
        // Unknown or already-canceled authorizations cancel as a no-op
        if let Some(mut intent) = self.intents.get_mut(intent_id) {
            intent.is_canceled = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{dummy_booking, dummy_gym};

    #[tokio::test]
    async fn test_create_then_retrieve_returns_same_secret() {
        let provider = DummyProvider::new();
        let gym = dummy_gym();
        let booking = dummy_booking(&gym);

        let created = provider.create_authorization(&booking, &gym).await.unwrap();
        let retrieved = provider.retrieve_authorization(&created.intent_id).await.unwrap();

        assert_eq!(created.client_secret, retrieved.client_secret);
        assert!(!retrieved.is_canceled);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_tolerates_unknown_ids() {
        let provider = DummyProvider::new();
        let gym = dummy_gym();
        let booking = dummy_booking(&gym);

        let created = provider.create_authorization(&booking, &gym).await.unwrap();
        provider.cancel_authorization(&created.intent_id).await.unwrap();
        provider.cancel_authorization(&created.intent_id).await.unwrap();
        provider.cancel_authorization("pi_dummy_never_existed").await.unwrap();

        let retrieved = provider.retrieve_authorization(&created.intent_id).await.unwrap();
        assert!(retrieved.is_canceled);
    }
}
