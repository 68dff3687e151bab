//! HTTP handlers for the booking lifecycle.
//!
//! Every owner-triggered transition loads the booking and gym together in one
//! consistent read, validates status and ownership against that snapshot, and
//! then writes through a conditional update. Guest notifications are
//! fire-and-forget: the status write is the source of truth.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        bookings::{
            BookingCreate, BookingCreatedResponse, BookingResponse, BookingStatusResponse, DeclineRequest, ListBookingsQuery,
        },
        users::CurrentUser,
    },
    auth::{Actor, authorize_gym_action},
    db::{
        errors::DbError,
        handlers::{Bookings, Gyms, Packages, Repository, Users},
        models::{
            bookings::{Booking, BookingCreateDBRequest, BookingFilter, BookingStatus},
            packages::BookingMode,
        },
    },
    errors::{Error, Result},
    types::{BookingId, GymId, Operation},
};

fn booking_not_found(id: BookingId) -> Error {
    Error::NotFound {
        resource: "Booking".to_string(),
        id: id.to_string(),
    }
}

/// Resolve the notification recipient for a booking: the guest identity, or
/// the owning account's email.
async fn booking_contact(conn: &mut PgConnection, booking: &Booking) -> Result<Option<(String, Option<String>)>> {
    if let Some(email) = &booking.guest_email {
        return Ok(Some((email.clone(), booking.guest_name.clone())));
    }
    let Some(user_id) = booking.user_id else {
        return Ok(None);
    };
    let user = Users::new(conn).get_by_id(user_id).await?;
    Ok(user.map(|u| (u.email, u.display_name)))
}

#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = BookingCreate,
    responses(
        (status = 200, description = "Booking created", body = BookingCreatedResponse),
        (status = 400, description = "Missing fields, invalid dates, or gym not accepting bookings"),
        (status = 404, description = "Gym not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Json(request): Json<BookingCreate>,
) -> Result<Json<BookingCreatedResponse>> {
    if request.end_date < request.start_date {
        return Err(Error::BadRequest {
            message: "end_date must not be before start_date".to_string(),
        });
    }
    if request.discipline.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "discipline is required".to_string(),
        });
    }
    if request.experience_level.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "experience_level is required".to_string(),
        });
    }
    if request.total_price <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "total_price must be positive".to_string(),
        });
    }

    // Guest bookings carry full guest identity; account bookings don't need it
    if user.is_none() {
        let guest_fields = [
            ("guest_email", &request.guest_email),
            ("guest_phone", &request.guest_phone),
            ("guest_name", &request.guest_name),
        ];
        for (field, value) in guest_fields {
            if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(Error::BadRequest {
                    message: format!("{field} is required for guest bookings"),
                });
            }
        }
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let gym = Gyms::new(&mut tx)
        .get_by_id(request.gym_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Gym".to_string(),
            id: request.gym_id.to_string(),
        })?;
    if !gym.accepts_bookings() {
        return Err(Error::BadRequest {
            message: "This gym is not currently accepting bookings".to_string(),
        });
    }

    let mode = Packages::new(&mut tx)
        .resolve_booking_mode(gym.id, request.package_id, request.package_variant_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::BadRequest {
                message: "Package does not exist or does not belong to this gym".to_string(),
            },
            other => Error::Database(other),
        })?;

    // The booking mode picks the entry point into the lifecycle
    let (status, request_submitted_at) = match mode {
        BookingMode::RequestToBook => (BookingStatus::Pending, Some(Utc::now())),
        BookingMode::Instant => (BookingStatus::PendingPayment, None),
    };

    let platform_fee = (request.total_price * state.config.bookings.platform_fee_rate).round_dp(2);

    let booking = Bookings::new(&mut tx)
        .create(&BookingCreateDBRequest {
            user_id: user.as_ref().map(|u| u.id),
            guest_email: request.guest_email.clone(),
            guest_phone: request.guest_phone.clone(),
            guest_name: request.guest_name.clone(),
            gym_id: gym.id,
            package_id: request.package_id,
            package_variant_id: request.package_variant_id,
            start_date: request.start_date,
            end_date: request.end_date,
            discipline: request.discipline.trim().to_string(),
            experience_level: request.experience_level.trim().to_string(),
            total_price: request.total_price,
            platform_fee,
            status,
            request_submitted_at,
        })
        .await?;

    let owner = Users::new(&mut tx).get_by_id(gym.owner_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Best effort: tell the owner a new request is waiting
    if status == BookingStatus::Pending {
        if let Some(owner) = owner {
            state
                .notifier
                .booking_requested(&owner.email, owner.display_name.as_deref(), &booking.booking_reference, &gym.name)
                .await;
        }
    }

    Ok(Json(BookingCreatedResponse {
        booking_id: booking.id,
        booking_reference: booking.booking_reference,
        booking_pin: booking.booking_pin,
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/accept-request",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Request accepted", body = BookingStatusResponse),
        (status = 400, description = "Booking is not awaiting approval"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller does not manage this gym"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn accept_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingStatusResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (updated, gym) = {
        let mut bookings = Bookings::new(&mut conn);
        let with_gym = bookings.get_with_gym(id).await?.ok_or_else(|| booking_not_found(id))?;
        authorize_gym_action(&Actor::User(user), &with_gym.gym, Operation::Accept)?;

        let updated = bookings
            .transition(id, BookingStatus::ACCEPTABLE, BookingStatus::GymConfirmed)
            .await?;
        let Some(updated) = updated else {
            let current = bookings.current_status(id).await?;
            return Err(Error::Conflict {
                message: "Only pending booking requests can be accepted".to_string(),
                current_status: current,
            });
        };
        (updated, with_gym.gym)
    };

    if let Some((email, name)) = booking_contact(&mut conn, &updated).await? {
        state
            .notifier
            .booking_accepted(&email, name.as_deref(), &updated.booking_reference, &gym.name)
            .await;
    }

    Ok(Json(BookingStatusResponse {
        booking_id: id,
        status: updated.status,
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/decline-request",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    request_body = DeclineRequest,
    responses(
        (status = 200, description = "Request declined", body = BookingStatusResponse),
        (status = 400, description = "Booking is not awaiting approval"),
        (status = 403, description = "Caller does not manage this gym"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn decline_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
    Json(request): Json<DeclineRequest>,
) -> Result<Json<BookingStatusResponse>> {
    decline(
        &state,
        Actor::User(user),
        id,
        BookingStatus::DECLINABLE,
        request.reason,
        "Only pending booking requests can be declined",
    )
    .await
}

/// Legacy pre-payment decline endpoint: only bookings still carrying the
/// deprecated `awaiting_approval` status pass its precondition.
#[utoipa::path(
    post,
    path = "/bookings/{id}/decline",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    request_body = DeclineRequest,
    responses(
        (status = 200, description = "Booking declined", body = BookingStatusResponse),
        (status = 400, description = "Booking is not awaiting approval"),
        (status = 403, description = "Caller does not manage this gym"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn decline_legacy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
    Json(request): Json<DeclineRequest>,
) -> Result<Json<BookingStatusResponse>> {
    decline(
        &state,
        Actor::User(user),
        id,
        &[BookingStatus::AwaitingApproval],
        request.reason,
        "Only bookings awaiting approval can be declined here",
    )
    .await
}

async fn decline(
    state: &AppState,
    actor: Actor,
    id: BookingId,
    from: &[BookingStatus],
    reason: Option<String>,
    conflict_message: &str,
) -> Result<Json<BookingStatusResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (booking, gym) = {
        let mut bookings = Bookings::new(&mut conn);
        let with_gym = bookings.get_with_gym(id).await?.ok_or_else(|| booking_not_found(id))?;
        authorize_gym_action(&actor, &with_gym.gym, Operation::Decline)?;
        (with_gym.booking, with_gym.gym)
    };

    // Check the precondition against the snapshot before touching the
    // processor, so a booking in the wrong state never loses its hold
    if !from.contains(&booking.status) {
        return Err(Error::Conflict {
            message: conflict_message.to_string(),
            current_status: Some(booking.status),
        });
    }

    // Release any held funds before flipping status. Processor failure here
    // aborts the decline: flipping status while a hold survives upstream would
    // strand the guest's money.
    if let Some(intent_id) = &booking.stripe_payment_intent_id {
        let provider = state.payments.as_ref().ok_or_else(|| Error::Internal {
            operation: "cancel a payment authorization without a configured payment provider".to_string(),
        })?;
        provider.cancel_authorization(intent_id).await?;
    }

    let updated = {
        let mut bookings = Bookings::new(&mut conn);
        let updated = bookings.transition(id, from, BookingStatus::Declined).await?;
        match updated {
            Some(updated) => updated,
            None => {
                let current = bookings.current_status(id).await?;
                return Err(Error::Conflict {
                    message: conflict_message.to_string(),
                    current_status: current,
                });
            }
        }
    };

    if let Some((email, name)) = booking_contact(&mut conn, &updated).await? {
        state
            .notifier
            .booking_declined(&email, name.as_deref(), &updated.booking_reference, &gym.name, reason.as_deref())
            .await;
    }

    Ok(Json(BookingStatusResponse {
        booking_id: id,
        status: updated.status,
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingStatusResponse),
        (status = 400, description = "Booking can no longer be cancelled"),
        (status = 403, description = "Caller is neither the booking owner nor managing the gym"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingStatusResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let booking = {
        let mut bookings = Bookings::new(&mut conn);
        let with_gym = bookings.get_with_gym(id).await?.ok_or_else(|| booking_not_found(id))?;
        let is_booking_owner = with_gym.booking.user_id == Some(user.id);
        if !is_booking_owner {
            authorize_gym_action(&Actor::User(user), &with_gym.gym, Operation::Cancel)?;
        }
        with_gym.booking
    };

    if !BookingStatus::CANCELLABLE.contains(&booking.status) {
        return Err(Error::Conflict {
            message: "Booking can no longer be cancelled".to_string(),
            current_status: Some(booking.status),
        });
    }

    if let Some(intent_id) = &booking.stripe_payment_intent_id {
        let provider = state.payments.as_ref().ok_or_else(|| Error::Internal {
            operation: "cancel a payment authorization without a configured payment provider".to_string(),
        })?;
        provider.cancel_authorization(intent_id).await?;
    }

    let mut bookings = Bookings::new(&mut conn);
    let updated = bookings.transition(id, BookingStatus::CANCELLABLE, BookingStatus::Cancelled).await?;
    let Some(updated) = updated else {
        let current = bookings.current_status(id).await?;
        return Err(Error::Conflict {
            message: "Booking can no longer be cancelled".to_string(),
            current_status: current,
        });
    };

    Ok(Json(BookingStatusResponse {
        booking_id: id,
        status: updated.status,
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking detail", body = BookingResponse),
        (status = 403, description = "Caller is neither the booking owner nor managing the gym"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn get_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let with_gym = Bookings::new(&mut conn)
        .get_with_gym(id)
        .await?
        .ok_or_else(|| booking_not_found(id))?;

    let is_booking_owner = with_gym.booking.user_id == Some(user.id);
    if !is_booking_owner {
        authorize_gym_action(&Actor::User(user), &with_gym.gym, Operation::Read)?;
    }

    let approx = state.rates.usd_total(with_gym.booking.total_price, &with_gym.gym.currency).await;

    Ok(Json(BookingResponse::from(with_gym.booking).with_approx_total_usd(approx)))
}

#[utoipa::path(
    get,
    path = "/gyms/{gym_id}/bookings",
    tag = "bookings",
    params(("gym_id" = String, Path, description = "Gym id"), ListBookingsQuery),
    responses(
        (status = 200, description = "Bookings for the gym, newest first", body = [BookingResponse]),
        (status = 403, description = "Caller does not manage this gym"),
        (status = 404, description = "Gym not found"),
    )
)]
#[tracing::instrument(skip_all, fields(gym_id = %gym_id))]
pub async fn list_gym_bookings(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(gym_id): Path<GymId>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let gym = Gyms::new(&mut conn).get_by_id(gym_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Gym".to_string(),
        id: gym_id.to_string(),
    })?;
    authorize_gym_action(&Actor::User(user), &gym, Operation::Read)?;

    let filter = BookingFilter {
        gym_id: Some(gym_id),
        status: query.status,
        skip: query.skip.unwrap_or(0).max(0),
        limit: query.limit.unwrap_or(50).clamp(1, 200),
    };
    let bookings = Bookings::new(&mut conn).list(&filter).await?;

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        auth_header, create_test_gym, create_test_package, create_test_server, create_test_user, guest_booking_body,
        set_booking_status,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_request_to_book_booking(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        let response = server.post("/api/v1/bookings").json(&guest_booking_body(gym.id, "100.00")).await;
        response.assert_status_ok();

        let body: BookingCreatedResponse = response.json();
        assert!(body.booking_reference.starts_with("BK-"));
        assert_eq!(body.booking_reference.len(), 6);
        assert!(body.booking_pin.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(body.booking_pin.len(), 6);

        let mut conn = pool.acquire().await.unwrap();
        let stored = Bookings::new(&mut conn).get_by_id(body.booking_id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert!(stored.request_submitted_at.is_some());
        assert_eq!(stored.platform_fee, Decimal::new(1000, 2)); // 10% of 100.00
    }

    #[sqlx::test]
    async fn test_instant_package_starts_pending_payment(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let package = create_test_package(&pool, gym.id, BookingMode::Instant).await;
        let server = create_test_server(pool.clone()).await;

        let mut body = guest_booking_body(gym.id, "250.00");
        body["package_id"] = json!(package.id);
        let response = server.post("/api/v1/bookings").json(&body).await;
        response.assert_status_ok();

        let created: BookingCreatedResponse = response.json();
        let mut conn = pool.acquire().await.unwrap();
        let stored = Bookings::new(&mut conn).get_by_id(created.booking_id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::PendingPayment);
        assert!(stored.request_submitted_at.is_none());
    }

    #[sqlx::test]
    async fn test_guest_booking_requires_guest_identity(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        let mut body = guest_booking_body(gym.id, "100.00");
        body["guest_email"] = json!(null);
        let response = server.post("/api/v1/bookings").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("guest_email"));
    }

    #[sqlx::test]
    async fn test_unknown_gym_is_404_and_unverified_gym_is_400(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let server = create_test_server(pool.clone()).await;

        let response = server
            .post("/api/v1/bookings")
            .json(&guest_booking_body(uuid::Uuid::new_v4(), "100.00"))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let mut unverified = create_test_gym(&pool, owner.id).await;
        {
            let mut conn = pool.acquire().await.unwrap();
            unverified = Gyms::new(&mut conn)
                .update(
                    unverified.id,
                    &crate::db::models::gyms::GymUpdateDBRequest {
                        is_verified: Some(false),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        let response = server.post("/api/v1/bookings").json(&guest_booking_body(unverified.id, "100.00")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_accept_as_owner_confirms_and_stamps(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        let created: BookingCreatedResponse = server
            .post("/api/v1/bookings")
            .json(&guest_booking_body(gym.id, "100.00"))
            .await
            .json();

        let (name, value) = auth_header(&owner);
        let response = server
            .post(&format!("/api/v1/bookings/{}/accept-request", created.booking_id))
            .add_header(name.as_str(), value.as_str())
            .await;
        response.assert_status_ok();

        let body: BookingStatusResponse = response.json();
        assert_eq!(body.status, BookingStatus::GymConfirmed);

        let mut conn = pool.acquire().await.unwrap();
        let stored = Bookings::new(&mut conn).get_by_id(created.booking_id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::GymConfirmed);
        assert!(stored.gym_confirmed_at.is_some());
    }

    #[sqlx::test]
    async fn test_accept_by_stranger_is_forbidden(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let stranger = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        let created: BookingCreatedResponse = server
            .post("/api/v1/bookings")
            .json(&guest_booking_body(gym.id, "100.00"))
            .await
            .json();

        let (name, value) = auth_header(&stranger);
        let response = server
            .post(&format!("/api/v1/bookings/{}/accept-request", created.booking_id))
            .add_header(name.as_str(), value.as_str())
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Without any credentials it's a 401
        let response = server.post(&format!("/api/v1/bookings/{}/accept-request", created.booking_id)).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_accept_declined_booking_conflicts_with_status_echo(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        let created: BookingCreatedResponse = server
            .post("/api/v1/bookings")
            .json(&guest_booking_body(gym.id, "100.00"))
            .await
            .json();

        let (name, value) = auth_header(&owner);
        server
            .post(&format!("/api/v1/bookings/{}/decline-request", created.booking_id))
            .add_header(name.as_str(), value.as_str())
            .json(&json!({"reason": "Fully booked"}))
            .await
            .assert_status_ok();

        let response = server
            .post(&format!("/api/v1/bookings/{}/accept-request", created.booking_id))
            .add_header(name.as_str(), value.as_str())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json();
        assert_eq!(body["current_status"], json!("declined"));
    }

    #[sqlx::test]
    async fn test_legacy_decline_requires_awaiting_approval(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        let created: BookingCreatedResponse = server
            .post("/api/v1/bookings")
            .json(&guest_booking_body(gym.id, "100.00"))
            .await
            .json();

        let (name, value) = auth_header(&owner);
        // A freshly created booking is `pending`, not `awaiting_approval`
        let response = server
            .post(&format!("/api/v1/bookings/{}/decline", created.booking_id))
            .add_header(name.as_str(), value.as_str())
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        set_booking_status(&pool, created.booking_id, BookingStatus::AwaitingApproval).await;
        let response = server
            .post(&format!("/api/v1/bookings/{}/decline", created.booking_id))
            .add_header(name.as_str(), value.as_str())
            .json(&json!({}))
            .await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    async fn test_gym_booking_listing_is_owner_only(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let stranger = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let server = create_test_server(pool.clone()).await;

        for _ in 0..3 {
            server
                .post("/api/v1/bookings")
                .json(&guest_booking_body(gym.id, "100.00"))
                .await
                .assert_status_ok();
        }

        let (name, value) = auth_header(&owner);
        let response = server
            .get(&format!("/api/v1/gyms/{}/bookings", gym.id))
            .add_header(name.as_str(), value.as_str())
            .await;
        response.assert_status_ok();
        let listed: Vec<BookingResponse> = response.json();
        assert_eq!(listed.len(), 3);

        let (name, value) = auth_header(&stranger);
        let response = server
            .get(&format!("/api/v1/gyms/{}/bookings", gym.id))
            .add_header(name.as_str(), value.as_str())
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
