//! Email service for booking notifications and magic links.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    dashboard_url: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                // File transport for development/testing
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            dashboard_url: config.dashboard_url.clone(),
        })
    }

    /// Payment link sent to the guest once the gym accepts their request.
    pub async fn send_payment_link_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        booking_reference: &str,
        gym_name: &str,
    ) -> Result<(), Error> {
        let payment_link = format!("{}/bookings/{}/pay", self.dashboard_url, booking_reference);
        let subject = format!("{gym_name} accepted your booking request");
        let body = self.payment_link_body(to_name, gym_name, booking_reference, &payment_link);
        self.send_email(to_email, to_name, &subject, &body).await
    }

    /// Decline notice sent to the guest.
    pub async fn send_declined_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        gym_name: &str,
        reason: Option<&str>,
    ) -> Result<(), Error> {
        let subject = format!("Update on your booking request at {gym_name}");
        let body = self.declined_body(to_name, gym_name, reason);
        self.send_email(to_email, to_name, &subject, &body).await
    }

    /// New-request notice sent to the gym owner.
    pub async fn send_booking_request_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        booking_reference: &str,
        gym_name: &str,
    ) -> Result<(), Error> {
        let dashboard_link = format!("{}/gym/bookings", self.dashboard_url);
        let subject = format!("New booking request for {gym_name}");
        let body = self.booking_request_body(to_name, gym_name, booking_reference, &dashboard_link);
        self.send_email(to_email, to_name, &subject, &body).await
    }

    /// Authorization-held notice sent to the gym owner.
    pub async fn send_payment_received_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        booking_reference: &str,
        gym_name: &str,
    ) -> Result<(), Error> {
        let subject = format!("Payment authorized for booking {booking_reference}");
        let body = self.payment_received_body(to_name, gym_name, booking_reference);
        self.send_email(to_email, to_name, &subject, &body).await
    }

    /// Magic link granting booking access without an account.
    pub async fn send_access_link_email(&self, to_email: &str, booking_reference: &str, raw_token: &str) -> Result<(), Error> {
        let access_link = format!("{}/bookings/access/{}", self.dashboard_url, raw_token);
        let subject = "Your booking access link".to_string();
        let body = self.access_link_body(booking_reference, &access_link);
        self.send_email(to_email, None, &subject, &body).await
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = if let Some(name) = to_name {
            format!("{name} <{to_email}>")
        } else {
            to_email.to_string()
        }
        .parse::<Mailbox>()
        .map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn greeting(to_name: Option<&str>) -> String {
        match to_name {
            Some(name) => format!("Hello {name},"),
            None => "Hello,".to_string(),
        }
    }

    fn payment_link_body(&self, to_name: Option<&str>, gym_name: &str, booking_reference: &str, payment_link: &str) -> String {
        let greeting = Self::greeting(to_name);
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <p>{greeting}</p>
    <p>Good news: <strong>{gym_name}</strong> has accepted your booking request
    <strong>{booking_reference}</strong>.</p>
    <p>To secure your spot, complete your payment:</p>
    <p><a href="{payment_link}">Complete payment</a></p>
    <p>Or copy and paste this link into your browser:</p>
    <p>{payment_link}</p>
    <p>Your card is only charged once the camp confirms everything is ready.</p>
</body>
</html>"#
        )
    }

    fn declined_body(&self, to_name: Option<&str>, gym_name: &str, reason: Option<&str>) -> String {
        let greeting = Self::greeting(to_name);
        let reason_line = match reason {
            Some(reason) => format!("<p>Message from the camp: {reason}</p>"),
            None => String::new(),
        };
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <p>{greeting}</p>
    <p>Unfortunately <strong>{gym_name}</strong> couldn't accept your booking request
    for the selected dates.</p>
    {reason_line}
    <p>No payment has been taken. We'd love to help you find another camp.</p>
</body>
</html>"#
        )
    }

    fn booking_request_body(&self, to_name: Option<&str>, gym_name: &str, booking_reference: &str, dashboard_link: &str) -> String {
        let greeting = Self::greeting(to_name);
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <p>{greeting}</p>
    <p>You have a new booking request <strong>{booking_reference}</strong> for
    <strong>{gym_name}</strong>.</p>
    <p><a href="{dashboard_link}">Review and respond</a></p>
</body>
</html>"#
        )
    }

    fn payment_received_body(&self, to_name: Option<&str>, gym_name: &str, booking_reference: &str) -> String {
        let greeting = Self::greeting(to_name);
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <p>{greeting}</p>
    <p>The guest's card has been authorized for booking
    <strong>{booking_reference}</strong> at <strong>{gym_name}</strong>.</p>
    <p>Funds are held and will be captured at settlement.</p>
</body>
</html>"#
        )
    }

    fn access_link_body(&self, booking_reference: &str, access_link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <p>Hello,</p>
    <p>Here is your access link for booking <strong>{booking_reference}</strong>:</p>
    <p><a href="{access_link}">View your booking</a></p>
    <p>Or copy and paste this link into your browser:</p>
    <p>{access_link}</p>
    <p>If you didn't request this link, you can safely ignore this email.</p>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;

    #[tokio::test]
    async fn test_email_service_creation() {
        let config = create_test_config();
        assert!(EmailService::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_payment_link_body_contains_link_and_reference() {
        let config = create_test_config();
        let service = EmailService::new(&config).unwrap();

        let body = service.payment_link_body(Some("Jo"), "Tiger Muay Thai", "BK-7XK", "https://example.com/bookings/BK-7XK/pay");

        assert!(body.contains("Hello Jo,"));
        assert!(body.contains("BK-7XK"));
        assert!(body.contains("https://example.com/bookings/BK-7XK/pay"));
    }

    #[tokio::test]
    async fn test_declined_body_with_and_without_reason() {
        let config = create_test_config();
        let service = EmailService::new(&config).unwrap();

        let with_reason = service.declined_body(None, "Tiger Muay Thai", Some("Fully booked that week"));
        assert!(with_reason.contains("Hello,"));
        assert!(with_reason.contains("Fully booked that week"));

        let without_reason = service.declined_body(None, "Tiger Muay Thai", None);
        assert!(!without_reason.contains("Message from the camp"));
    }

    #[tokio::test]
    async fn test_access_link_body_embeds_raw_token() {
        let config = create_test_config();
        let service = EmailService::new(&config).unwrap();

        let body = service.access_link_body("BK-7XK", "https://example.com/bookings/access/abc123");
        assert!(body.contains("https://example.com/bookings/access/abc123"));
    }
}
