//! # campbook: Booking backend for combat-sports training camps
//!
//! `campbook` is the booking and payment coordination service behind a
//! marketplace connecting fighters and trainees with training camps ("gyms").
//! It owns the booking lifecycle: guests or account holders create a booking,
//! the gym owner accepts or declines the request, the guest's card is
//! authorized (held, not captured) through a payment processor, and an
//! external settlement process later captures the funds.
//!
//! ## Architecture
//!
//! The service is built on [Axum](https://github.com/tokio-rs/axum) for the
//! HTTP layer and PostgreSQL (via sqlx) for persistence. Handlers are
//! stateless request processors; there is no in-process scheduler or queue.
//! Concurrency comes entirely from simultaneous external requests (guest
//! retries, webhook redelivery, double-clicks) racing on the same booking
//! row, and correctness relies on idempotent, precondition-checked writes:
//!
//! - status transitions are single conditional UPDATEs keyed on the expected
//!   "from" states, with the affected-row count as the success signal;
//! - payment-intent creation reuses a stored, still-live authorization and
//!   guards the fresh-create path with a conditional write, so repeated calls
//!   never double-authorize a card;
//! - single-use access tokens are redeemed through a conditional
//!   `used_at IS NULL` update, giving exactly one winner under concurrent
//!   redemption.
//!
//! The **API layer** ([`api`]) exposes the booking surface under `/api/v1`
//! plus a Stripe webhook at `/webhooks/payments`. The **database layer**
//! ([`db`]) uses the repository pattern; each entity has a repository over a
//! `PgConnection`. The **payments layer** ([`payments`]) abstracts the
//! processor behind a trait with Stripe and in-memory implementations.
//! Guest notifications ([`notifications`]) are fire-and-forget email sends:
//! the booking-status write is the durable source of truth, never the
//! notification delivery.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use campbook::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = campbook::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     campbook::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
mod email;
pub mod errors;
pub mod notifications;
mod openapi;
pub mod payments;
pub mod rates;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::CorsOrigin;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::notifications::Notifier;
use crate::openapi::ApiDoc;
use crate::payments::PaymentProvider;
use crate::rates::RateCache;

pub use types::{AccessTokenId, BookingId, GymId, PackageId, PackageVariantId, UserId};

/// Application state shared across all request handlers.
///
/// - `db`: PostgreSQL connection pool
/// - `config`: application configuration
/// - `payments`: configured payment provider, if any
/// - `notifier`: fire-and-forget email notifications
/// - `rates`: injected exchange-rate cache for approximate USD totals
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payments: Option<Arc<dyn PaymentProvider>>,
    pub notifier: Arc<Notifier>,
    pub rates: Arc<RateCache>,
}

/// Get the campbook database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Ensure the configured admin account exists (idempotent, runs at startup).
#[instrument(skip_all)]
pub async fn ensure_admin_user(email: &str, db: &PgPool) -> anyhow::Result<UserId> {
    let mut conn = db.acquire().await?;
    let mut users = Users::new(&mut conn);

    if let Some(existing) = users.get_by_email(email).await? {
        if !existing.is_admin {
            let updated = users
                .update(
                    existing.id,
                    &UserUpdateDBRequest {
                        display_name: None,
                        is_admin: Some(true),
                    },
                )
                .await?;
            return Ok(updated.id);
        }
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            display_name: Some("Platform Admin".to_string()),
            is_admin: true,
        })
        .await?;

    Ok(created.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/bookings", post(api::handlers::bookings::create_booking))
        .route("/bookings/{id}", get(api::handlers::bookings::get_booking))
        .route("/bookings/{id}/accept-request", post(api::handlers::bookings::accept_request))
        .route("/bookings/{id}/decline-request", post(api::handlers::bookings::decline_request))
        .route("/bookings/{id}/decline", post(api::handlers::bookings::decline_legacy))
        .route("/bookings/{id}/cancel", post(api::handlers::bookings::cancel_booking))
        .route("/bookings/{id}/payment-intent", post(api::handlers::payments::create_payment_intent))
        .route("/bookings/{id}/confirm-payment", post(api::handlers::payments::confirm_payment))
        .route("/bookings/{id}/access-token", post(api::handlers::access::mint_access_token))
        .route("/bookings/access/{token}", get(api::handlers::access::validate_access_token))
        .route("/bookings/guest-access", post(api::handlers::access::guest_access))
        .route("/bookings/request-access", post(api::handlers::access::request_access))
        .route("/gyms/{gym_id}/bookings", get(api::handlers::bookings::list_gym_bookings))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook routes (external services, not part of the client API docs)
        .route("/webhooks/payments", post(api::handlers::payments::stripe::webhook))
        .with_state(state.clone())
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled application: pool, router, and a bound listener.
pub struct Application {
    state: AppState,
    router: Router,
    listener: TcpListener,
}

impl Application {
    /// Connect to the database, run migrations, and bind the listener.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.pool.max_connections)
            .min_connections(config.database.pool.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.database.pool.acquire_timeout_secs))
            .connect(&config.database.url)
            .await?;

        Self::with_pool(config, pool).await
    }

    /// Assemble the application over an existing pool (used by tests).
    pub async fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;
        ensure_admin_user(&config.admin_email, &pool).await?;

        let payments_provider = config.payment.clone().map(payments::create_provider);
        let notifier = Arc::new(Notifier::new(&config));
        let rates = Arc::new(RateCache::new(config.rates.clone()));

        let state = AppState::builder()
            .db(pool)
            .config(config)
            .maybe_payments(payments_provider)
            .notifier(notifier)
            .rates(rates)
            .build();

        let router = build_router(&state)?;
        let listener = TcpListener::bind(state.config.bind_address()).await?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self { state, router, listener })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn local_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router).with_graceful_shutdown(shutdown).await?;
        Ok(())
    }
}
