//! Database repository for bookings.
//!
//! The booking row is the single shared mutable resource of the system. Every
//! status mutation here is a single conditional UPDATE keyed on the expected
//! "from" states, with the affected-row count as the success signal - there is
//! no read-then-blind-write anywhere in this module.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    crypto,
    db::{
        errors::Result,
        models::bookings::{Booking, BookingCreateDBRequest, BookingFilter, BookingStatus, BookingWithGym},
    },
    types::{BookingId, abbrev_uuid},
};

const BOOKING_COLUMNS: &str = "id, booking_reference, booking_pin, user_id, guest_email, guest_phone, guest_name, \
     gym_id, package_id, package_variant_id, start_date, end_date, discipline, experience_level, \
     total_price, platform_fee, stripe_payment_intent_id, status, request_submitted_at, \
     gym_confirmed_at, created_at, updated_at";

/// How many candidate references we generate before accepting a possible
/// (astronomically unlikely) duplicate. The unique index is the backstop.
const REFERENCE_ATTEMPTS: usize = 10;

pub struct Bookings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Bookings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a booking, generating its reference (collision-checked, with
    /// retry) and PIN.
    #[instrument(skip(self, request), err)]
    pub async fn create(&mut self, request: &BookingCreateDBRequest) -> Result<Booking> {
        let reference = self.unique_reference_with(crypto::generate_booking_reference).await?;
        let pin = crypto::generate_booking_pin();
        self.insert(request, &reference, &pin).await
    }

    /// Generate a booking reference that does not collide with any persisted
    /// booking, drawing candidates from `generate`. Gives up after 10 attempts
    /// and returns the last candidate; the unique index on
    /// `booking_reference` then has the final say.
    pub async fn unique_reference_with(&mut self, mut generate: impl FnMut() -> String) -> Result<String> {
        let mut reference = generate();
        for _ in 1..REFERENCE_ATTEMPTS {
            if !self.reference_exists(&reference).await? {
                return Ok(reference);
            }
            reference = generate();
        }
        Ok(reference)
    }

    async fn reference_exists(&mut self, reference: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM bookings WHERE booking_reference = $1")
            .bind(reference)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&mut self, request: &BookingCreateDBRequest, reference: &str, pin: &str) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (
                booking_reference, booking_pin, user_id, guest_email, guest_phone, guest_name,
                gym_id, package_id, package_variant_id, start_date, end_date, discipline,
                experience_level, total_price, platform_fee, status, request_submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(reference)
        .bind(pin)
        .bind(request.user_id)
        .bind(&request.guest_email)
        .bind(&request.guest_phone)
        .bind(&request.guest_name)
        .bind(request.gym_id)
        .bind(request.package_id)
        .bind(request.package_variant_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.discipline)
        .bind(&request.experience_level)
        .bind(request.total_price)
        .bind(request.platform_fee)
        .bind(request.status)
        .bind(request.request_submitted_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(booking)
    }

    #[instrument(skip(self, id), fields(booking_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: BookingId) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(booking)
    }

    /// Load a booking joined with its gym in a single consistent read, so
    /// ownership and status preconditions are checked against one snapshot.
    #[instrument(skip(self, id), fields(booking_id = %abbrev_uuid(&id)), err)]
    pub async fn get_with_gym(&mut self, id: BookingId) -> Result<Option<BookingWithGym>> {
        let row = sqlx::query_as::<_, BookingWithGym>(&format!(
            r#"
            SELECT {booking_columns},
                   g.owner_id AS gym_owner_id, g.name AS gym_name, g.city AS gym_city,
                   g.country AS gym_country, g.currency AS gym_currency,
                   g.is_verified AS gym_is_verified, g.is_active AS gym_is_active,
                   g.created_at AS gym_created_at, g.updated_at AS gym_updated_at
            FROM bookings b
            JOIN gyms g ON g.id = b.gym_id
            WHERE b.id = $1
            "#,
            booking_columns = qualified_booking_columns()
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Exact-match lookup by case-normalized reference.
    #[instrument(skip(self, reference), err)]
    pub async fn find_by_reference(&mut self, reference: &str) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(booking)
    }

    /// Lookup by reference and guest email together (recovery-link flow).
    #[instrument(skip_all, err)]
    pub async fn find_by_reference_and_email(&mut self, reference: &str, email: &str) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_reference = $1 AND LOWER(guest_email) = LOWER($2)"
        ))
        .bind(reference)
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(booking)
    }

    /// Find the booking a payment authorization belongs to (webhook path).
    #[instrument(skip_all, err)]
    pub async fn find_by_payment_intent(&mut self, intent_id: &str) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE stripe_payment_intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(booking)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let mut query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE 1=1");
        let mut bind_idx = 0;
        if filter.gym_id.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND gym_id = ${bind_idx}"));
        }
        if filter.status.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND status = ${bind_idx}"));
        }
        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, Booking>(&query);
        if let Some(gym_id) = filter.gym_id {
            sql_query = sql_query.bind(gym_id);
        }
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        let bookings = sql_query.fetch_all(&mut *self.db).await?;
        Ok(bookings)
    }

    /// Re-read just the status, for Conflict diagnostics after a lost
    /// conditional write.
    #[instrument(skip(self, id), err)]
    pub async fn current_status(&mut self, id: BookingId) -> Result<Option<BookingStatus>> {
        let status: Option<(BookingStatus,)> = sqlx::query_as("SELECT status FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(status.map(|(s,)| s))
    }

    /// Atomically move a booking from one of the `from` statuses to `to`.
    ///
    /// Returns the updated row on success, or None when the booking was not in
    /// any of the expected statuses (including when it does not exist); the
    /// caller decides how to report that. `gym_confirmed_at` is stamped by the
    /// same statement when the target is `gym_confirmed`.
    #[instrument(skip(self, id), fields(booking_id = %abbrev_uuid(&id), to = %to), err)]
    pub async fn transition(&mut self, id: BookingId, from: &[BookingStatus], to: BookingStatus) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $2,
                gym_confirmed_at = CASE WHEN $2 = 'gym_confirmed'::booking_status THEN NOW() ELSE gym_confirmed_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to)
        .bind(from)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(booking)
    }

    /// Attach a payment authorization and force the booking into
    /// `pending_payment`, guarded against concurrent first-creation: the write
    /// only lands if the stored intent id still equals `expected_current`
    /// (normally None) and the status still permits payment. Returns whether
    /// this call won.
    #[instrument(skip(self, id, intent_id, expected_current), fields(booking_id = %abbrev_uuid(&id)), err)]
    pub async fn attach_payment_intent(
        &mut self,
        id: BookingId,
        intent_id: &str,
        expected_current: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET stripe_payment_intent_id = $2,
                status = 'pending_payment',
                updated_at = NOW()
            WHERE id = $1
              AND stripe_payment_intent_id IS NOT DISTINCT FROM $3
              AND status = ANY($4)
            "#,
        )
        .bind(id)
        .bind(intent_id)
        .bind(expected_current)
        .bind(BookingStatus::PAYABLE)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist the intent id reported by a payment callback when none is
    /// stored yet. Guarded by `stripe_payment_intent_id IS NULL`; a false
    /// return means another writer got there first and the caller must
    /// re-verify the stored id.
    #[instrument(skip(self, id, intent_id), fields(booking_id = %abbrev_uuid(&id)), err)]
    pub async fn record_payment_intent_if_absent(&mut self, id: BookingId, intent_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET stripe_payment_intent_id = $2, updated_at = NOW()
            WHERE id = $1 AND stripe_payment_intent_id IS NULL
            "#,
        )
        .bind(id)
        .bind(intent_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn qualified_booking_columns() -> String {
    BOOKING_COLUMNS
        .split(", ")
        .map(|col| format!("b.{}", col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
