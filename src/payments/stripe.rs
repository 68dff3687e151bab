//! Stripe payment provider implementation

use async_trait::async_trait;
use std::collections::HashMap;
use stripe::{CancelPaymentIntent, Client, CreatePaymentIntent, PaymentIntent, PaymentIntentCaptureMethod, PaymentIntentStatus};

use crate::{
    config::StripeConfig,
    db::models::{bookings::Booking, gyms::Gym},
    payments::{PaymentAuthorization, PaymentError, PaymentProvider, Result, amount_minor_units},
};

/// Stripe payment provider
pub struct StripeProvider {
    api_key: String,
    webhook_secret: String,
}

impl StripeProvider {
    pub fn new(api_key: String, webhook_secret: String) -> Self {
        Self { api_key, webhook_secret }
    }

    pub fn from_config(config: StripeConfig) -> Self {
        Self::new(config.api_key, config.webhook_secret)
    }

    /// Get a Stripe client
    fn client(&self) -> Client {
        Client::new(&self.api_key)
    }

    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }
}

fn authorization_from_intent(intent: PaymentIntent) -> PaymentAuthorization {
    PaymentAuthorization {
        intent_id: intent.id.to_string(),
        client_secret: intent.client_secret,
        is_canceled: intent.status == PaymentIntentStatus::Canceled,
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_authorization(&self, booking: &Booking, gym: &Gym) -> Result<PaymentAuthorization> {
        let client = self.client();

        let currency: stripe::Currency = gym
            .currency
            .parse()
            .map_err(|_| PaymentError::InvalidData(format!("Unsupported currency '{}'", gym.currency)))?;
        let amount = amount_minor_units(booking.total_price)?;

        let mut params = CreatePaymentIntent::new(amount, currency);
        // Manual capture: the hold lives for the gym's accept/decline window,
        // funds only move when settlement captures later
        params.capture_method = Some(PaymentIntentCaptureMethod::Manual);
        params.payment_method_types = Some(vec!["card".to_string()]);
        params.metadata = Some(HashMap::from([
            ("booking_id".to_string(), booking.id.to_string()),
            ("booking_reference".to_string(), booking.booking_reference.clone()),
            ("gym_id".to_string(), gym.id.to_string()),
        ]));

        let intent = PaymentIntent::create(&client, params).await.map_err(|e| {
            tracing::error!("Failed to create Stripe payment intent: {:?}", e);
            PaymentError::ProviderApi(e.to_string())
        })?;

        tracing::info!(
            "Created payment intent {} for booking {}",
            intent.id,
            booking.booking_reference
        );

        Ok(authorization_from_intent(intent))
    }

    async fn retrieve_authorization(&self, intent_id: &str) -> Result<PaymentAuthorization> {
        let client = self.client();

        let intent_id: stripe::PaymentIntentId = intent_id
            .parse()
            .map_err(|_| PaymentError::InvalidData("Invalid Stripe payment intent ID".to_string()))?;

        let intent = PaymentIntent::retrieve(&client, &intent_id, &[]).await.map_err(|e| {
            // A stale or foreign id retrieves as an error; callers fall back
            // to creating a fresh authorization
            tracing::warn!("Failed to retrieve Stripe payment intent {}: {:?}", intent_id, e);
            PaymentError::AuthorizationNotFound
        })?;

        Ok(authorization_from_intent(intent))
    }

    async fn cancel_authorization(&self, intent_id: &str) -> Result<()> {
        let client = self.client();

        let intent_id: stripe::PaymentIntentId = intent_id
            .parse()
            .map_err(|_| PaymentError::InvalidData("Invalid Stripe payment intent ID".to_string()))?;

        // Already-canceled (or vanished) authorizations are a no-op
        let intent = match PaymentIntent::retrieve(&client, &intent_id, &[]).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!("Payment intent {} not retrievable while canceling, skipping: {:?}", intent_id, e);
                return Ok(());
            }
        };

        if intent.status == PaymentIntentStatus::Canceled {
            tracing::debug!("Payment intent {} already canceled", intent_id);
            return Ok(());
        }

        PaymentIntent::cancel(&client, &intent_id, CancelPaymentIntent::default())
            .await
            .map_err(|e| {
                tracing::error!("Failed to cancel Stripe payment intent {}: {:?}", intent_id, e);
                PaymentError::ProviderApi(e.to_string())
            })?;

        tracing::info!("Canceled payment intent {}", intent_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_provider_creation() {
        let provider = StripeProvider::new("sk_test_fake".to_string(), "whsec_fake".to_string());

        assert_eq!(provider.api_key, "sk_test_fake");
        assert_eq!(provider.webhook_secret(), "whsec_fake");
    }
}
