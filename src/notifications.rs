//! Fire-and-forget booking notifications.
//!
//! The booking-status write is the durable source of truth, not the
//! notification delivery: every method here logs failures and swallows them,
//! so a transition never fails because an email bounced. With email disabled
//! in config, the notifier degrades to log lines.

use crate::{config::Config, email::EmailService};

pub struct Notifier {
    email: Option<EmailService>,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        let email = if config.email.enabled {
            match EmailService::new(config) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create email service, notifications degrade to logging");
                    None
                }
            }
        } else {
            None
        };

        Self { email }
    }

    /// Tell the gym owner a new request arrived.
    pub async fn booking_requested(&self, owner_email: &str, owner_name: Option<&str>, booking_reference: &str, gym_name: &str) {
        let Some(email) = &self.email else {
            tracing::info!(booking_reference, "Email disabled, skipping booking-request notification");
            return;
        };
        if let Err(e) = email
            .send_booking_request_email(owner_email, owner_name, booking_reference, gym_name)
            .await
        {
            tracing::warn!(booking_reference, error = %e, "Failed to send booking-request notification");
        }
    }

    /// Tell the guest their request was accepted and payment is due.
    pub async fn booking_accepted(&self, guest_email: &str, guest_name: Option<&str>, booking_reference: &str, gym_name: &str) {
        let Some(email) = &self.email else {
            tracing::info!(booking_reference, "Email disabled, skipping acceptance notification");
            return;
        };
        if let Err(e) = email
            .send_payment_link_email(guest_email, guest_name, booking_reference, gym_name)
            .await
        {
            tracing::warn!(booking_reference, error = %e, "Failed to send acceptance notification");
        }
    }

    /// Tell the guest their request was declined.
    pub async fn booking_declined(
        &self,
        guest_email: &str,
        guest_name: Option<&str>,
        booking_reference: &str,
        gym_name: &str,
        reason: Option<&str>,
    ) {
        let Some(email) = &self.email else {
            tracing::info!(booking_reference, "Email disabled, skipping decline notification");
            return;
        };
        if let Err(e) = email.send_declined_email(guest_email, guest_name, gym_name, reason).await {
            tracing::warn!(booking_reference, error = %e, "Failed to send decline notification");
        }
    }

    /// Tell the gym owner the guest's card has been authorized.
    pub async fn payment_authorized(&self, owner_email: &str, owner_name: Option<&str>, booking_reference: &str, gym_name: &str) {
        let Some(email) = &self.email else {
            tracing::info!(booking_reference, "Email disabled, skipping payment notification");
            return;
        };
        if let Err(e) = email
            .send_payment_received_email(owner_email, owner_name, booking_reference, gym_name)
            .await
        {
            tracing::warn!(booking_reference, error = %e, "Failed to send payment notification");
        }
    }

    /// Send a magic link to a guest. The raw token appears only in this email
    /// and in the mint response.
    pub async fn access_link(&self, guest_email: &str, booking_reference: &str, raw_token: &str) {
        let Some(email) = &self.email else {
            tracing::info!(booking_reference, "Email disabled, skipping access-link notification");
            return;
        };
        if let Err(e) = email.send_access_link_email(guest_email, booking_reference, raw_token).await {
            tracing::warn!(booking_reference, error = %e, "Failed to send access link");
        }
    }
}
