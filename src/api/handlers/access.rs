//! HTTP handlers for booking access tokens and guest self-service lookup.
//!
//! Two independent recovery paths: reference + PIN (for guests who kept
//! their confirmation), and email + reference (mints a fresh magic link).
//! The latter answers identically for hits and misses so the endpoint cannot
//! be used to enumerate which reference/email combinations exist.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    api::models::access::{
        AccessDescriptorResponse, AccessTokenResponse, GuestAccessRequest, GuestAccessResponse, MintAccessTokenRequest,
        RequestAccessRequest, RequestAccessResponse,
    },
    api::models::bookings::BookingResponse,
    crypto,
    db::handlers::{BookingAccessTokens, Bookings, Gyms, Packages, Repository},
    errors::{Error, Result},
    types::{BookingId, Operation, abbrev_uuid},
};

const RECOVERY_MESSAGE: &str = "If a booking exists for that reference and email, we've sent an access link to your inbox.";

fn token_validity(state: &AppState, requested_days: Option<i64>) -> Result<Duration> {
    match requested_days {
        Some(days) if days < 1 => Err(Error::BadRequest {
            message: "expires_in_days must be at least 1".to_string(),
        }),
        Some(days) => Ok(Duration::days(days)),
        None => Ok(Duration::from_std(state.config.bookings.access_token_validity).unwrap_or_else(|_| Duration::days(90))),
    }
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/access-token",
    tag = "access",
    params(("id" = String, Path, description = "Booking id")),
    request_body = MintAccessTokenRequest,
    responses(
        (status = 200, description = "Raw token, observable only here", body = AccessTokenResponse),
        (status = 400, description = "Missing email"),
        (status = 403, description = "Email does not match the booking's guest email"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn mint_access_token(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(request): Json<MintAccessTokenRequest>,
) -> Result<Json<AccessTokenResponse>> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(Error::BadRequest {
            message: "email is required".to_string(),
        });
    }
    let validity = token_validity(&state, request.expires_in_days)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let booking = Bookings::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Booking".to_string(),
        id: id.to_string(),
    })?;

    // A token may only be issued to the address the booking was made with;
    // anything else would let a caller harvest access by substituting their
    // own email
    if let Some(guest_email) = &booking.guest_email {
        if !guest_email.eq_ignore_ascii_case(email) {
            return Err(Error::InsufficientPermissions {
                action: Operation::Create,
                resource: format!("an access token for booking {}", abbrev_uuid(&booking.id)),
            });
        }
    }

    let expires_at = Utc::now() + validity;
    let (raw_token, token) = BookingAccessTokens::new(&mut conn)
        .issue(booking.id, email, expires_at, request.single_use)
        .await?;

    Ok(Json(AccessTokenResponse {
        token: raw_token,
        expires_at: token.expires_at,
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/access/{token}",
    tag = "access",
    params(("token" = String, Path, description = "Raw access token")),
    responses(
        (status = 200, description = "Token is valid", body = AccessDescriptorResponse),
        (status = 400, description = "Malformed token"),
        (status = 404, description = "Unknown token"),
        (status = 410, description = "Expired or already used"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn validate_access_token(
    State(state): State<AppState>,
    Path(raw_token): Path<String>,
) -> Result<Json<AccessDescriptorResponse>> {
    // Cheap malformed-input filter before any hashing or lookup
    if raw_token.len() < crypto::MIN_TOKEN_LEN {
        return Err(Error::BadRequest {
            message: "Malformed access token".to_string(),
        });
    }

    let token_hash = crypto::hash_token(&raw_token);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut tokens = BookingAccessTokens::new(&mut conn);

    let token = tokens.find_by_hash(&token_hash).await?.ok_or_else(|| Error::NotFound {
        resource: "Access token".to_string(),
        id: token_hash[..8].to_string(),
    })?;

    if token.is_expired(Utc::now()) {
        return Err(Error::Gone {
            message: "This access link has expired".to_string(),
        });
    }
    if token.is_single_use {
        if token.used_at.is_some() {
            return Err(Error::Gone {
                message: "This access link has already been used".to_string(),
            });
        }
        // Conditional stamp: under concurrent redemption exactly one request
        // passes, the rest land here
        if !tokens.mark_used(token.id).await? {
            return Err(Error::Gone {
                message: "This access link has already been used".to_string(),
            });
        }
    }

    Ok(Json(AccessDescriptorResponse {
        booking_id: token.booking_id,
        email: token.email,
        expires_at: token.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/guest-access",
    tag = "access",
    request_body = GuestAccessRequest,
    responses(
        (status = 200, description = "Booking with gym and package, PIN stripped", body = GuestAccessResponse),
        (status = 401, description = "Wrong PIN"),
        (status = 404, description = "Unknown reference"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn guest_access(State(state): State<AppState>, Json(request): Json<GuestAccessRequest>) -> Result<Json<GuestAccessResponse>> {
    let reference = request.booking_reference.trim().to_uppercase();
    let pin = request.booking_pin.trim();
    if reference.is_empty() || pin.is_empty() {
        return Err(Error::BadRequest {
            message: "booking_reference and booking_pin are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let booking = Bookings::new(&mut conn)
        .find_by_reference(&reference)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Booking".to_string(),
            id: reference.clone(),
        })?;

    if booking.booking_pin != pin {
        return Err(Error::Unauthenticated {
            message: Some("That PIN does not match this booking reference. Check the PIN on your confirmation.".to_string()),
        });
    }

    let gym = Gyms::new(&mut conn).get_by_id(booking.gym_id).await?.ok_or_else(|| Error::Internal {
        operation: format!("load gym for booking {}", abbrev_uuid(&booking.id)),
    })?;

    let mut packages = Packages::new(&mut conn);
    let package = match booking.package_id {
        Some(package_id) => packages.get_by_id(package_id).await?,
        None => None,
    };
    let variant = match booking.package_variant_id {
        Some(variant_id) => packages.get_variant(variant_id).await?,
        None => None,
    };

    // BookingResponse carries no PIN field: once authenticated via the PIN,
    // it is never re-exposed
    Ok(Json(GuestAccessResponse {
        booking: BookingResponse::from(booking),
        gym: gym.into(),
        package: package.map(Into::into),
        package_variant: variant.map(Into::into),
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/request-access",
    tag = "access",
    request_body = RequestAccessRequest,
    responses(
        (status = 200, description = "Generic acknowledgement, identical for hits and misses", body = RequestAccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn request_access(
    State(state): State<AppState>,
    Json(request): Json<RequestAccessRequest>,
) -> Result<Json<RequestAccessResponse>> {
    let reference = request.booking_reference.trim().to_uppercase();
    let email = request.email.trim().to_string();

    if !reference.is_empty() && !email.is_empty() {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let booking = Bookings::new(&mut conn).find_by_reference_and_email(&reference, &email).await?;

        if let Some(booking) = booking {
            let validity = token_validity(&state, None)?;
            let (raw_token, _) = BookingAccessTokens::new(&mut conn)
                .issue(booking.id, &email, Utc::now() + validity, false)
                .await?;
            state.notifier.access_link(&email, &booking.booking_reference, &raw_token).await;
        }
    }

    // The same body either way - this endpoint must not leak which
    // reference/email combinations are registered
    Ok(Json(RequestAccessResponse {
        success: true,
        message: RECOVERY_MESSAGE.to_string(),
    }))
}
