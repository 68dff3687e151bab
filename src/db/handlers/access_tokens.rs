//! Database repository for booking access tokens.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    crypto,
    db::{
        errors::Result,
        models::access_tokens::{AccessTokenCreateDBRequest, BookingAccessToken},
    },
    types::{AccessTokenId, BookingId, abbrev_uuid},
};

const TOKEN_COLUMNS: &str = "id, booking_id, token_hash, email, expires_at, is_single_use, used_at, created_at";

pub struct BookingAccessTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BookingAccessTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Persist a token record. Only the hash of the raw token is stored.
    #[instrument(skip(self, request), fields(booking_id = %abbrev_uuid(&request.booking_id)), err)]
    pub async fn create(&mut self, request: &AccessTokenCreateDBRequest) -> Result<BookingAccessToken> {
        let token_hash = crypto::hash_token(&request.raw_token);

        let token = sqlx::query_as::<_, BookingAccessToken>(&format!(
            r#"
            INSERT INTO booking_access_tokens (booking_id, token_hash, email, expires_at, is_single_use)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(request.booking_id)
        .bind(&token_hash)
        .bind(&request.email)
        .bind(request.expires_at)
        .bind(request.is_single_use)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(token)
    }

    /// Mint a fresh token for a booking and return the raw value alongside the
    /// stored record. This is the only point where the raw token is observable.
    #[instrument(skip(self, email), fields(booking_id = %abbrev_uuid(&booking_id)), err)]
    pub async fn issue(
        &mut self,
        booking_id: BookingId,
        email: &str,
        expires_at: DateTime<Utc>,
        is_single_use: bool,
    ) -> Result<(String, BookingAccessToken)> {
        let raw_token = crypto::generate_access_token();

        let token = self
            .create(&AccessTokenCreateDBRequest {
                booking_id,
                raw_token: raw_token.clone(),
                email: email.to_string(),
                expires_at,
                is_single_use,
            })
            .await?;

        Ok((raw_token, token))
    }

    /// Look up a token by the hash of the presented raw value. Lookup is by
    /// hash equality only, never by raw value or prefix.
    #[instrument(skip_all, err)]
    pub async fn find_by_hash(&mut self, token_hash: &str) -> Result<Option<BookingAccessToken>> {
        let token = sqlx::query_as::<_, BookingAccessToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM booking_access_tokens WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(token)
    }

    /// Stamp a single-use token as consumed. The update is guarded by
    /// `used_at IS NULL` so that concurrent redemption attempts produce
    /// exactly one winner; returns whether this call was it.
    #[instrument(skip(self, id), err)]
    pub async fn mark_used(&mut self, id: AccessTokenId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE booking_access_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_booking, create_test_gym, create_test_user};
    use sqlx::PgPool;
    use sqlx::Row;

    #[sqlx::test]
    async fn test_only_hash_is_persisted(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let booking = create_test_booking(&pool, &gym).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut tokens = BookingAccessTokens::new(&mut conn);
        let (raw, stored) = tokens
            .issue(booking.id, "guest@example.com", Utc::now() + chrono::Duration::days(90), false)
            .await
            .unwrap();

        assert_eq!(stored.token_hash, crypto::hash_token(&raw));
        assert_ne!(stored.token_hash, raw);

        // Nothing in the table matches the raw value
        let row = sqlx::query("SELECT COUNT(*) AS count FROM booking_access_tokens WHERE token_hash = $1")
            .bind(&raw)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 0);
    }

    #[sqlx::test]
    async fn test_single_use_redemption_has_one_winner(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let gym = create_test_gym(&pool, owner.id).await;
        let booking = create_test_booking(&pool, &gym).await;

        let token_id = {
            let mut conn = pool.acquire().await.unwrap();
            let mut tokens = BookingAccessTokens::new(&mut conn);
            let (_, stored) = tokens
                .issue(booking.id, "guest@example.com", Utc::now() + chrono::Duration::days(1), true)
                .await
                .unwrap();
            stored.id
        };

        // Two concurrent redemption attempts on separate connections
        let (a, b) = tokio::join!(
            async {
                let mut conn = pool.acquire().await.unwrap();
                BookingAccessTokens::new(&mut conn).mark_used(token_id).await.unwrap()
            },
            async {
                let mut conn = pool.acquire().await.unwrap();
                BookingAccessTokens::new(&mut conn).mark_used(token_id).await.unwrap()
            }
        );

        assert!(a ^ b, "exactly one redemption must win, got ({a}, {b})");
    }
}
