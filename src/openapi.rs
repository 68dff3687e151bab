//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::api::models::{
    access::{
        AccessDescriptorResponse, AccessTokenResponse, GuestAccessRequest, GuestAccessResponse, MintAccessTokenRequest,
        RequestAccessRequest, RequestAccessResponse,
    },
    bookings::{
        BookingCreate, BookingCreatedResponse, BookingResponse, BookingStatusResponse, DeclineRequest, PackageSummary,
        PackageVariantSummary,
    },
    gyms::GymSummary,
    payments::{ConfirmPaymentRequest, ConfirmPaymentResponse, PaymentIntentResponse},
};
use crate::db::models::{bookings::BookingStatus, packages::BookingMode};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CampBook API",
        description = "Booking and payment coordination for combat-sports training camps"
    ),
    servers((url = "/api/v1")),
    paths(
        crate::api::handlers::bookings::create_booking,
        crate::api::handlers::bookings::get_booking,
        crate::api::handlers::bookings::accept_request,
        crate::api::handlers::bookings::decline_request,
        crate::api::handlers::bookings::decline_legacy,
        crate::api::handlers::bookings::cancel_booking,
        crate::api::handlers::bookings::list_gym_bookings,
        crate::api::handlers::payments::create_payment_intent,
        crate::api::handlers::payments::confirm_payment,
        crate::api::handlers::access::mint_access_token,
        crate::api::handlers::access::validate_access_token,
        crate::api::handlers::access::guest_access,
        crate::api::handlers::access::request_access,
    ),
    components(schemas(
        BookingCreate,
        BookingCreatedResponse,
        BookingResponse,
        BookingStatusResponse,
        DeclineRequest,
        GymSummary,
        PackageSummary,
        PackageVariantSummary,
        MintAccessTokenRequest,
        AccessTokenResponse,
        AccessDescriptorResponse,
        GuestAccessRequest,
        GuestAccessResponse,
        RequestAccessRequest,
        RequestAccessResponse,
        PaymentIntentResponse,
        ConfirmPaymentRequest,
        ConfirmPaymentResponse,
        BookingStatus,
        BookingMode,
    )),
    tags(
        (name = "bookings", description = "Booking lifecycle"),
        (name = "payments", description = "Payment authorization"),
        (name = "access", description = "Guest access tokens and recovery"),
    )
)]
pub struct ApiDoc;
