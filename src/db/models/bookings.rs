//! Database models for bookings: the central entity and its status machine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::fmt;
use utoipa::ToSchema;

use crate::db::models::gyms::Gym;
use crate::types::{BookingId, GymId, PackageId, PackageVariantId, UserId};

/// The authoritative booking status.
///
/// Transitions are monotonic along the lifecycle graph; a terminal status is
/// never left. All writes go through conditional updates keyed on the
/// expected "from" states (see `db::handlers::bookings::Bookings::transition`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting gym-owner approval (request-to-book flow)
    Pending,
    /// Awaiting a card payment authorization
    PendingPayment,
    /// Payment authorized (held, not captured), awaiting settlement
    PendingConfirmation,
    /// Gym owner accepted the request; guest owes a payment authorization
    GymConfirmed,
    /// Deprecated alias of the pending flow, kept for rows created before the
    /// status vocabulary was consolidated. New flows never produce it.
    AwaitingApproval,
    /// Gym owner declined; terminal
    Declined,
    /// Funds captured by settlement
    Confirmed,
    /// Stay finished; enables post-stay reviews; terminal
    Completed,
    /// Cancelled by guest or owner before capture; terminal
    Cancelled,
}

impl BookingStatus {
    /// Statuses from which a gym owner may accept a request.
    pub const ACCEPTABLE: &[BookingStatus] = &[BookingStatus::Pending, BookingStatus::AwaitingApproval];

    /// Statuses from which a gym owner may decline a request.
    pub const DECLINABLE: &[BookingStatus] = &[BookingStatus::Pending, BookingStatus::AwaitingApproval];

    /// Statuses in which a payment authorization may be created or reused.
    pub const PAYABLE: &[BookingStatus] = &[BookingStatus::Pending, BookingStatus::PendingPayment];

    /// Statuses a guest/owner cancellation can leave. `confirmed` is excluded:
    /// captured funds require the out-of-scope refund path.
    pub const CANCELLABLE: &[BookingStatus] = &[
        BookingStatus::Pending,
        BookingStatus::PendingPayment,
        BookingStatus::PendingConfirmation,
        BookingStatus::GymConfirmed,
        BookingStatus::AwaitingApproval,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Declined | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::PendingConfirmation => "pending_confirmation",
            BookingStatus::GymConfirmed => "gym_confirmed",
            BookingStatus::AwaitingApproval => "awaiting_approval",
            BookingStatus::Declined => "declined",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: BookingId,
    pub booking_reference: String,
    pub booking_pin: String,
    /// None means a guest booking; guest identity fields are then all set
    pub user_id: Option<UserId>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_name: Option<String>,
    pub gym_id: GymId,
    pub package_id: Option<PackageId>,
    pub package_variant_id: Option<PackageVariantId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub discipline: String,
    pub experience_level: String,
    pub total_price: Decimal,
    pub platform_fee: Decimal,
    /// At most one authorization per booking, enforced by idempotent reuse
    pub stripe_payment_intent_id: Option<String>,
    pub status: BookingStatus,
    pub request_submitted_at: Option<DateTime<Utc>>,
    pub gym_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_guest_booking(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Database request for creating a booking.
///
/// Reference and PIN are generated inside the repository (with collision
/// retry), not supplied by the caller.
#[derive(Debug, Clone)]
pub struct BookingCreateDBRequest {
    pub user_id: Option<UserId>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_name: Option<String>,
    pub gym_id: GymId,
    pub package_id: Option<PackageId>,
    pub package_variant_id: Option<PackageVariantId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub discipline: String,
    pub experience_level: String,
    pub total_price: Decimal,
    pub platform_fee: Decimal,
    pub status: BookingStatus,
    pub request_submitted_at: Option<DateTime<Utc>>,
}

/// Filter for listing bookings
#[derive(Debug, Clone)]
pub struct BookingFilter {
    pub gym_id: Option<GymId>,
    pub status: Option<BookingStatus>,
    pub skip: i64,
    pub limit: i64,
}

impl BookingFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            gym_id: None,
            status: None,
            skip,
            limit,
        }
    }
}

/// A booking joined with its gym in one consistent read.
///
/// Status and ownership preconditions are both validated against this single
/// snapshot, never against separately cached reads.
#[derive(Debug, Clone)]
pub struct BookingWithGym {
    pub booking: Booking,
    pub gym: Gym,
}

impl<'r> FromRow<'r, PgRow> for BookingWithGym {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let booking = Booking::from_row(row)?;
        let gym = Gym {
            id: row.try_get("gym_id")?,
            owner_id: row.try_get("gym_owner_id")?,
            name: row.try_get("gym_name")?,
            city: row.try_get("gym_city")?,
            country: row.try_get("gym_country")?,
            currency: row.try_get("gym_currency")?,
            is_verified: row.try_get("gym_is_verified")?,
            is_active: row.try_get("gym_is_active")?,
            created_at: row.try_get("gym_created_at")?,
            updated_at: row.try_get("gym_updated_at")?,
        };
        Ok(Self { booking, gym })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_reject_owner_actions() {
        for status in [BookingStatus::Declined, BookingStatus::Completed, BookingStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(!BookingStatus::ACCEPTABLE.contains(&status));
            assert!(!BookingStatus::DECLINABLE.contains(&status));
            assert!(!BookingStatus::CANCELLABLE.contains(&status));
        }
        // Captured funds can no longer be cancelled from this surface either
        assert!(!BookingStatus::CANCELLABLE.contains(&BookingStatus::Confirmed));
    }

    #[test]
    fn test_legacy_alias_is_acceptable_and_declinable() {
        assert!(BookingStatus::ACCEPTABLE.contains(&BookingStatus::AwaitingApproval));
        assert!(BookingStatus::DECLINABLE.contains(&BookingStatus::AwaitingApproval));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&BookingStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"pending_payment\"");
        assert_eq!(BookingStatus::GymConfirmed.to_string(), "gym_confirmed");
    }
}
