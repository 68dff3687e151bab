//! HTTP handlers for payment processing endpoints.
//!
//! Create-or-reuse never creates a duplicate authorization for a booking:
//! a stored, still-live intent is always returned unchanged, and the fresh
//! creation path is guarded by a conditional write so concurrent first
//! creations leave exactly one stored intent id.

use axum::{
    Json,
    extract::{Path, State},
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        payments::{ConfirmPaymentRequest, ConfirmPaymentResponse, PaymentIntentResponse},
        users::CurrentUser,
    },
    db::{
        handlers::{Bookings, Gyms, Repository, Users},
        models::bookings::{Booking, BookingStatus},
    },
    errors::{Error, Result},
    payments::PaymentError,
    types::{BookingId, Operation},
};

fn booking_not_found(id: BookingId) -> Error {
    Error::NotFound {
        resource: "Booking".to_string(),
        id: id.to_string(),
    }
}

fn already_processed(current: BookingStatus) -> Error {
    Error::Conflict {
        message: "Booking already processed".to_string(),
        current_status: Some(current),
    }
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/payment-intent",
    tag = "payments",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Client secret for the card flow", body = PaymentIntentResponse),
        (status = 400, description = "Booking already processed"),
        (status = 403, description = "Account booking paid by someone else"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Payment provider not configured or unreachable"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<BookingId>,
) -> Result<Json<PaymentIntentResponse>> {
    let provider = state.payments.clone().ok_or_else(|| Error::Internal {
        operation: "create a payment authorization without a configured payment provider".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let with_gym = Bookings::new(&mut conn)
        .get_with_gym(id)
        .await?
        .ok_or_else(|| booking_not_found(id))?;
    let (booking, gym) = (with_gym.booking, with_gym.gym);

    // Guest bookings have no session to check; account bookings may only be
    // paid by their owner or an admin
    if let Some(owner_id) = booking.user_id {
        match &user {
            Some(u) if u.id == owner_id || u.is_admin => {}
            _ => {
                return Err(Error::InsufficientPermissions {
                    action: Operation::Update,
                    resource: "this booking's payment".to_string(),
                });
            }
        }
    }

    if !BookingStatus::PAYABLE.contains(&booking.status) {
        return Err(already_processed(booking.status));
    }

    // Idempotent reuse: a stored, still-live authorization is returned
    // unchanged so page reloads never double-authorize
    let stored_intent = booking.stripe_payment_intent_id.clone();
    if let Some(intent_id) = &stored_intent {
        match provider.retrieve_authorization(intent_id).await {
            Ok(auth) if !auth.is_canceled => {
                if let Some(secret) = auth.client_secret {
                    // Subsequent loads must not stay blocked behind a
                    // `pending` status that already carries an intent
                    if booking.status == BookingStatus::Pending {
                        Bookings::new(&mut conn)
                            .transition(id, &[BookingStatus::Pending], BookingStatus::PendingPayment)
                            .await?;
                    }
                    return Ok(Json(PaymentIntentResponse { client_secret: secret }));
                }
                tracing::warn!("Stored intent {} has no client secret, creating a fresh authorization", intent_id);
            }
            Ok(_) => {
                tracing::info!("Stored intent {} is canceled, creating a fresh authorization", intent_id);
            }
            Err(PaymentError::AuthorizationNotFound) => {
                tracing::info!("Stored intent {} is stale or foreign, creating a fresh authorization", intent_id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let auth = provider.create_authorization(&booking, &gym).await?;
    let client_secret = auth.client_secret.clone().ok_or_else(|| Error::Internal {
        operation: "obtain a client secret for the new authorization".to_string(),
    })?;

    let mut bookings = Bookings::new(&mut conn);
    if bookings.attach_payment_intent(id, &auth.intent_id, stored_intent.as_deref()).await? {
        return Ok(Json(PaymentIntentResponse { client_secret }));
    }

    // A concurrent request attached its own intent first. Release ours and
    // hand back the winner's secret so neither caller sees an error.
    if let Err(e) = provider.cancel_authorization(&auth.intent_id).await {
        tracing::warn!("Failed to release losing authorization {}: {}", auth.intent_id, e);
    }

    let current = bookings.get_by_id(id).await?.ok_or_else(|| booking_not_found(id))?;
    if let Some(winner_id) = &current.stripe_payment_intent_id {
        if let Ok(winner) = provider.retrieve_authorization(winner_id).await {
            if !winner.is_canceled {
                if let Some(secret) = winner.client_secret {
                    return Ok(Json(PaymentIntentResponse { client_secret: secret }));
                }
            }
        }
    }

    Err(Error::Conflict {
        message: "Payment authorization changed concurrently, please retry".to_string(),
        current_status: Some(current.status),
    })
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/confirm-payment",
    tag = "payments",
    params(("id" = String, Path, description = "Booking id")),
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded (idempotent)", body = ConfirmPaymentResponse),
        (status = 400, description = "Intent mismatch or wrong status"),
        (status = 404, description = "Booking not found"),
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>> {
    let intent_id = request.payment_intent_id.trim();
    if intent_id.is_empty() {
        return Err(Error::BadRequest {
            message: "payment_intent_id is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let booking = Bookings::new(&mut conn).get_by_id(id).await?.ok_or_else(|| booking_not_found(id))?;

    let status = apply_payment_authorized(&state, &mut conn, booking, intent_id).await?;

    Ok(Json(ConfirmPaymentResponse { success: true, status }))
}

/// Drive the payment-authorized transition for `booking`.
///
/// Runs at an internal trust boundary (client callback or webhook - there is
/// no user session to authorize). Idempotent: re-delivery after the booking
/// has already advanced returns the current status as success.
pub(crate) async fn apply_payment_authorized(
    state: &AppState,
    conn: &mut PgConnection,
    booking: Booking,
    intent_id: &str,
) -> Result<BookingStatus> {
    // Idempotent short-circuit for retried callbacks and webhook re-delivery
    if matches!(booking.status, BookingStatus::PendingConfirmation | BookingStatus::Confirmed) {
        tracing::debug!(
            "Booking {} already {}, treating payment confirmation as a no-op",
            booking.booking_reference,
            booking.status
        );
        return Ok(booking.status);
    }

    let status = {
        let mut bookings = Bookings::new(&mut *conn);

        match &booking.stripe_payment_intent_id {
            // Mismatch means a foreign or superseded intent: fail without mutating
            Some(stored) if stored != intent_id => {
                return Err(Error::BadRequest {
                    message: "Payment intent does not match this booking".to_string(),
                });
            }
            Some(_) => {}
            None => {
                // Persist the reported intent id; when another writer got
                // there first, re-verify instead of overwriting
                if !bookings.record_payment_intent_if_absent(booking.id, intent_id).await? {
                    let current = bookings.get_by_id(booking.id).await?.ok_or_else(|| booking_not_found(booking.id))?;
                    if current.stripe_payment_intent_id.as_deref() != Some(intent_id) {
                        return Err(Error::BadRequest {
                            message: "Payment intent does not match this booking".to_string(),
                        });
                    }
                }
            }
        }

        let updated = bookings
            .transition(booking.id, &[BookingStatus::PendingPayment], BookingStatus::PendingConfirmation)
            .await?;
        match updated {
            Some(updated) => updated.status,
            None => {
                let current = bookings
                    .current_status(booking.id)
                    .await?
                    .ok_or_else(|| booking_not_found(booking.id))?;
                if matches!(current, BookingStatus::PendingConfirmation | BookingStatus::Confirmed) {
                    // A concurrent delivery landed first; still a success
                    current
                } else {
                    return Err(Error::Conflict {
                        message: "Payment cannot be confirmed from the booking's current status".to_string(),
                        current_status: Some(current),
                    });
                }
            }
        }
    };

    // Best-effort owner notification; never fails the transition
    let gym = Gyms::new(&mut *conn).get_by_id(booking.gym_id).await?;
    if let Some(gym) = gym {
        if let Some(owner) = Users::new(&mut *conn).get_by_id(gym.owner_id).await? {
            state
                .notifier
                .payment_authorized(&owner.email, owner.display_name.as_deref(), &booking.booking_reference, &gym.name)
                .await;
        }
    }

    Ok(status)
}

/// Stripe-specific webhook handling
pub mod stripe {
    use axum::{
        body::Body,
        extract::{FromRequest, State},
        http::{Request, StatusCode},
        response::{IntoResponse, Response},
    };
    use stripe::{Event, EventObject, EventType, Webhook};

    use crate::{AppState, config::PaymentConfig, db::handlers::Bookings, errors::Error};

    /// StripeEvent extractor that validates webhook signatures
    pub struct StripeEvent(pub Event);

    impl FromRequest<AppState> for StripeEvent
    where
        String: FromRequest<AppState>,
    {
        type Rejection = Response;

        async fn from_request(req: Request<Body>, state: &AppState) -> Result<Self, Self::Rejection> {
            let signature = if let Some(sig) = req.headers().get("stripe-signature") {
                sig.to_owned()
            } else {
                tracing::error!("Missing stripe-signature header");
                return Err(StatusCode::BAD_REQUEST.into_response());
            };
            let signature = signature.to_str().map_err(|_| StatusCode::BAD_REQUEST.into_response())?.to_string();

            let payload = String::from_request(req, state).await.map_err(IntoResponse::into_response)?;

            let webhook_secret = match state.config.payment.as_ref() {
                Some(PaymentConfig::Stripe(stripe_config)) => &stripe_config.webhook_secret,
                _ => {
                    tracing::error!("Stripe webhook called but Stripe is not configured");
                    return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
                }
            };

            Ok(Self(Webhook::construct_event(&payload, &signature, webhook_secret).map_err(
                |e| {
                    tracing::error!("Failed to construct webhook event: {:?}", e);
                    StatusCode::BAD_REQUEST.into_response()
                },
            )?))
        }
    }

    /// Stripe webhook handler.
    ///
    /// `payment_intent.amount_capturable_updated` fires when a manual-capture
    /// authorization succeeds; it drives the same idempotent transition as
    /// the client callback. Always returns 200 for processed events to
    /// prevent Stripe retries.
    #[tracing::instrument(skip_all)]
    pub async fn webhook(State(state): State<AppState>, StripeEvent(event): StripeEvent) -> StatusCode {
        tracing::debug!("Received webhook event: {:?}", event.type_);

        match event.type_ {
            EventType::PaymentIntentAmountCapturableUpdated => {
                let intent = match event.data.object {
                    EventObject::PaymentIntent(intent) => intent,
                    _ => {
                        tracing::error!("Expected PaymentIntent object, got something else");
                        return StatusCode::OK;
                    }
                };

                match process_authorized_intent(&state, &intent.id.to_string()).await {
                    Ok(()) => StatusCode::OK,
                    Err(e) => {
                        tracing::warn!("Failed to process authorized intent {}: {:#}", intent.id, e);
                        StatusCode::OK
                    }
                }
            }
            _ => {
                tracing::debug!("Ignoring webhook event type: {:?}", event.type_);
                StatusCode::OK
            }
        }
    }

    async fn process_authorized_intent(state: &AppState, intent_id: &str) -> Result<(), Error> {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

        let booking = Bookings::new(&mut conn).find_by_payment_intent(intent_id).await?;
        let Some(booking) = booking else {
            tracing::warn!("No booking references payment intent {}", intent_id);
            return Ok(());
        };

        super::apply_payment_authorized(state, &mut conn, booking, intent_id).await?;
        Ok(())
    }
}
