//! Database models for packages and their variants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{GymId, PackageId, PackageVariantId};

/// How a booking for this offering enters the lifecycle.
///
/// `request_to_book` holds the booking for gym-owner approval before any
/// payment; `instant` expects a payment authorization immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_mode", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    RequestToBook,
    Instant,
}

impl Default for BookingMode {
    fn default() -> Self {
        BookingMode::RequestToBook
    }
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Package {
    pub id: PackageId,
    pub gym_id: GymId,
    pub name: String,
    pub booking_mode: BookingMode,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct PackageVariant {
    pub id: PackageVariantId,
    pub package_id: PackageId,
    pub name: String,
    pub duration_weeks: i32,
    pub price: Decimal,
    /// None inherits the package's mode
    pub booking_mode: Option<BookingMode>,
}

/// Database request for creating a package
#[derive(Debug, Clone)]
pub struct PackageCreateDBRequest {
    pub gym_id: GymId,
    pub name: String,
    pub booking_mode: BookingMode,
    pub price: Decimal,
}

/// Database request for creating a package variant
#[derive(Debug, Clone)]
pub struct PackageVariantCreateDBRequest {
    pub package_id: PackageId,
    pub name: String,
    pub duration_weeks: i32,
    pub price: Decimal,
    pub booking_mode: Option<BookingMode>,
}
