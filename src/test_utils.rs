//! Shared constructors and fixtures for the crate's tests.

use axum_test::TestServer;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    AppState,
    config::{Config, EmailConfig, EmailTransportConfig, PaymentConfig, ProxyHeaderAuthConfig},
    db::{
        handlers::{Bookings, Gyms, Packages, Repository, Users},
        models::{
            bookings::{Booking, BookingCreateDBRequest, BookingStatus},
            gyms::{Gym, GymCreateDBRequest},
            packages::{BookingMode, Package, PackageCreateDBRequest},
            users::{User, UserCreateDBRequest},
        },
    },
    notifications::Notifier,
    payments,
    rates::RateCache,
};

pub fn create_test_config() -> Config {
    // Temp directory for the file email transport
    let temp_dir = std::env::temp_dir().join(format!("campbook-test-emails-{}", std::process::id()));

    Config {
        email: EmailConfig {
            enabled: true,
            transport: EmailTransportConfig::File {
                path: temp_dir.to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        payment: Some(PaymentConfig::Dummy(Default::default())),
        ..Default::default()
    }
}

pub async fn create_test_state(pool: PgPool) -> AppState {
    let config = create_test_config();
    let payments_provider = config.payment.clone().map(payments::create_provider);

    AppState::builder()
        .db(pool)
        .config(config.clone())
        .maybe_payments(payments_provider)
        .notifier(Arc::new(Notifier::new(&config)))
        .rates(Arc::new(RateCache::new(config.rates.clone())))
        .build()
}

pub fn server_from_state(state: AppState) -> TestServer {
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub async fn create_test_server(pool: PgPool) -> TestServer {
    server_from_state(create_test_state(pool).await)
}

pub async fn create_test_user(pool: &PgPool, is_admin: bool) -> User {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let unique = Uuid::new_v4().simple().to_string();

    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: format!("testuser_{unique}@example.com"),
            display_name: Some("Test User".to_string()),
            is_admin,
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_gym(pool: &PgPool, owner_id: Uuid) -> Gym {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    Gyms::new(&mut conn)
        .create(&GymCreateDBRequest {
            owner_id,
            name: format!("Test Gym {}", Uuid::new_v4().simple()),
            city: "Phuket".to_string(),
            country: "TH".to_string(),
            currency: "usd".to_string(),
            is_verified: true,
            is_active: true,
        })
        .await
        .expect("Failed to create test gym")
}

pub async fn create_test_package(pool: &PgPool, gym_id: Uuid, booking_mode: BookingMode) -> Package {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    Packages::new(&mut conn)
        .create(&PackageCreateDBRequest {
            gym_id,
            name: "Training camp pass".to_string(),
            booking_mode,
            price: Decimal::new(25000, 2),
        })
        .await
        .expect("Failed to create test package")
}

/// A valid guest creation body for the booking endpoint.
pub fn guest_booking_body(gym_id: Uuid, total_price: &str) -> serde_json::Value {
    serde_json::json!({
        "gym_id": gym_id,
        "start_date": "2026-09-01",
        "end_date": "2026-09-08",
        "discipline": "muay_thai",
        "experience_level": "beginner",
        "total_price": total_price,
        "guest_email": "guest@example.com",
        "guest_phone": "+66111111111",
        "guest_name": "Guest Example",
    })
}

/// A request-to-book guest booking, for repository-level tests.
pub fn booking_request(gym_id: Uuid) -> BookingCreateDBRequest {
    BookingCreateDBRequest {
        user_id: None,
        guest_email: Some("guest@example.com".to_string()),
        guest_phone: Some("+66111111111".to_string()),
        guest_name: Some("Guest Example".to_string()),
        gym_id,
        package_id: None,
        package_variant_id: None,
        start_date: "2026-09-01".parse().unwrap(),
        end_date: "2026-09-08".parse().unwrap(),
        discipline: "muay_thai".to_string(),
        experience_level: "beginner".to_string(),
        total_price: Decimal::new(10000, 2),
        platform_fee: Decimal::new(1000, 2),
        status: BookingStatus::Pending,
        request_submitted_at: Some(Utc::now()),
    }
}

pub async fn create_test_booking(pool: &PgPool, gym: &Gym) -> Booking {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Bookings::new(&mut conn)
        .create(&booking_request(gym.id))
        .await
        .expect("Failed to create test booking")
}

/// Force a booking into an arbitrary status, bypassing the transition guards
/// (for arranging legacy or terminal states in tests).
pub async fn set_booking_status(pool: &PgPool, booking_id: Uuid, status: BookingStatus) {
    sqlx::query("UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(booking_id)
        .bind(status)
        .execute(pool)
        .await
        .expect("Failed to set booking status");
}

/// The identity header the proxy would assert for `user`.
pub fn auth_header(user: &User) -> (String, String) {
    let config = ProxyHeaderAuthConfig::default();
    (config.header_name, user.email.clone())
}

/// An in-memory gym for provider unit tests that never touch the database.
pub fn dummy_gym() -> Gym {
    Gym {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Dummy Gym".to_string(),
        city: "Phuket".to_string(),
        country: "TH".to_string(),
        currency: "usd".to_string(),
        is_verified: true,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// An in-memory booking for provider unit tests.
pub fn dummy_booking(gym: &Gym) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        booking_reference: "BK-TST".to_string(),
        booking_pin: "123456".to_string(),
        user_id: None,
        guest_email: Some("guest@example.com".to_string()),
        guest_phone: Some("+66111111111".to_string()),
        guest_name: Some("Guest Example".to_string()),
        gym_id: gym.id,
        package_id: None,
        package_variant_id: None,
        start_date: "2026-09-01".parse().unwrap(),
        end_date: "2026-09-08".parse().unwrap(),
        discipline: "muay_thai".to_string(),
        experience_level: "beginner".to_string(),
        total_price: Decimal::new(10000, 2),
        platform_fee: Decimal::new(1000, 2),
        stripe_payment_intent_id: None,
        status: BookingStatus::Pending,
        request_submitted_at: Some(Utc::now()),
        gym_confirmed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
