//! API request/response models for bookings.
//!
//! `BookingResponse` deliberately has no PIN field: once a guest has
//! authenticated with the PIN it must not be re-exposed, so the response type
//! cannot carry it at all. The PIN is emitted exactly once, in
//! `BookingCreatedResponse`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::bookings::{Booking, BookingStatus};
use crate::db::models::packages::{Package, PackageVariant};
use crate::types::{BookingId, GymId, PackageId, PackageVariantId, UserId};

use super::gyms::GymSummary;

/// Request body for creating a booking.
///
/// Guest identity fields are required together when the caller is not
/// authenticated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingCreate {
    #[schema(value_type = String, format = "uuid")]
    pub gym_id: GymId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub package_id: Option<PackageId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub package_variant_id: Option<PackageVariantId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub discipline: String,
    pub experience_level: String,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_name: Option<String>,
}

/// Response to a successful creation: the only surface where the PIN appears.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingCreatedResponse {
    #[schema(value_type = String, format = "uuid")]
    pub booking_id: BookingId,
    pub booking_reference: String,
    pub booking_pin: String,
}

/// The booking as exposed to owners, admins and authenticated guests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BookingId,
    pub booking_reference: String,
    pub status: BookingStatus,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub gym_id: GymId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub package_id: Option<PackageId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub package_variant_id: Option<PackageVariantId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub discipline: String,
    pub experience_level: String,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    #[schema(value_type = String)]
    pub platform_fee: Decimal,
    /// Approximate USD total for non-USD gyms, when the rate cache has quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub approx_total_usd: Option<Decimal>,
    /// Whether a payment authorization exists, without exposing the
    /// processor-side identifier
    pub has_payment_authorization: bool,
    pub request_submitted_at: Option<DateTime<Utc>>,
    pub gym_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            booking_reference: booking.booking_reference,
            status: booking.status,
            user_id: booking.user_id,
            guest_name: booking.guest_name,
            guest_email: booking.guest_email,
            gym_id: booking.gym_id,
            package_id: booking.package_id,
            package_variant_id: booking.package_variant_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            discipline: booking.discipline,
            experience_level: booking.experience_level,
            total_price: booking.total_price,
            platform_fee: booking.platform_fee,
            approx_total_usd: None,
            has_payment_authorization: booking.stripe_payment_intent_id.is_some(),
            request_submitted_at: booking.request_submitted_at,
            gym_confirmed_at: booking.gym_confirmed_at,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

impl BookingResponse {
    /// Attach an approximate USD total (owner-facing detail views).
    pub fn with_approx_total_usd(mut self, approx: Option<Decimal>) -> Self {
        self.approx_total_usd = approx;
        self
    }
}

/// Package summary embedded in guest lookups.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: PackageId,
    pub name: String,
    #[schema(value_type = String)]
    pub price: Decimal,
}

impl From<Package> for PackageSummary {
    fn from(package: Package) -> Self {
        Self {
            id: package.id,
            name: package.name,
            price: package.price,
        }
    }
}

/// Variant summary embedded in guest lookups.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageVariantSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: PackageVariantId,
    pub name: String,
    pub duration_weeks: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
}

impl From<PackageVariant> for PackageVariantSummary {
    fn from(variant: PackageVariant) -> Self {
        Self {
            id: variant.id,
            name: variant.name,
            duration_weeks: variant.duration_weeks,
            price: variant.price,
        }
    }
}

/// Response to an owner-triggered transition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingStatusResponse {
    #[schema(value_type = String, format = "uuid")]
    pub booking_id: BookingId,
    pub status: BookingStatus,
}

/// Request body for declining a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeclineRequest {
    /// Optional message relayed to the guest
    pub reason: Option<String>,
}

/// Query parameters for listing a gym's bookings.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            booking_reference: "BK-7XK".to_string(),
            booking_pin: "123456".to_string(),
            user_id: None,
            guest_email: Some("guest@example.com".to_string()),
            guest_phone: Some("+6611111111".to_string()),
            guest_name: Some("Guest".to_string()),
            gym_id: Uuid::new_v4(),
            package_id: None,
            package_variant_id: None,
            start_date: "2026-09-01".parse().unwrap(),
            end_date: "2026-09-08".parse().unwrap(),
            discipline: "muay_thai".to_string(),
            experience_level: "beginner".to_string(),
            total_price: Decimal::new(10000, 2),
            platform_fee: Decimal::new(1000, 2),
            stripe_payment_intent_id: Some("pi_123".to_string()),
            status: BookingStatus::Pending,
            request_submitted_at: Some(Utc::now()),
            gym_confirmed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_never_contains_pin() {
        let response = BookingResponse::from(sample_booking());
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("booking_pin").is_none());
        // The processor-side id stays internal too
        assert!(json.get("stripe_payment_intent_id").is_none());
        assert_eq!(json.get("has_payment_authorization"), Some(&serde_json::Value::Bool(true)));
    }
}
