use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::{
        errors::DbError,
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::{Error, Result},
};

/// Extract user from the trusted proxy header if present and valid
/// Returns:
/// - None: No proxy header present
/// - Some(Ok(user)): Valid proxy header found and user resolved
/// - Some(Err(error)): Proxy header present but user lookup/creation failed
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(
    parts: &Parts,
    config: &crate::config::Config,
    db: &PgPool,
) -> Option<Result<CurrentUser>> {
    let user_email = match parts
        .headers
        .get(&config.auth.proxy_header.header_name)
        .and_then(|h| h.to_str().ok())
    {
        Some(email) => email,
        None => return None,
    };

    let mut conn = match db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };
    let mut user_repo = Users::new(&mut conn);

    match user_repo.get_by_email(user_email).await {
        Ok(Some(user)) => Some(Ok(user.into())),
        Ok(None) => {
            if config.auth.proxy_header.auto_create_users {
                let create_request = UserCreateDBRequest {
                    email: user_email.to_string(),
                    display_name: None,
                    is_admin: false,
                };

                match user_repo.create(&create_request).await {
                    Ok(new_user) => Some(Ok(new_user.into())),
                    Err(e) => Some(Err(Error::Database(e))),
                }
            } else {
                None
            }
        }
        Err(e) => Some(Err(Error::Database(e))),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if state.config.auth.proxy_header.enabled {
            match try_proxy_header_auth(parts, &state.config, &state.db).await {
                Some(Ok(user)) => {
                    debug!("Found proxy header authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("Proxy header authentication failed: {:?}", e);
                    return Err(Error::Unauthenticated { message: None });
                }
                None => {
                    trace!("No proxy header authentication attempted");
                }
            }
        }

        Err(Error::Unauthenticated { message: None })
    }
}

/// Guest-or-user endpoints extract `Option<CurrentUser>`: missing credentials
/// mean a guest, anything else still fails the request.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(Error::Unauthenticated { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_existing_user_extraction(pool: PgPool) {
        let state = create_test_state(pool.clone()).await;
        let user = create_test_user(&pool, false).await;

        let mut parts = parts_with_header("x-campbook-user", &user.email);
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(current.id, user.id);
        assert_eq!(current.email, user.email);
        assert!(!current.is_admin);
    }

    #[sqlx::test]
    async fn test_unknown_user_is_auto_created(pool: PgPool) {
        let state = create_test_state(pool.clone()).await;
        let email = "fresh-owner@example.com";

        let mut parts = parts_with_header("x-campbook-user", email);
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.email, email);

        // Row actually exists now
        let mut conn = pool.acquire().await.unwrap();
        let found = Users::new(&mut conn).get_by_email(email).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(current.id));
    }

    #[sqlx::test]
    async fn test_missing_header_is_unauthenticated(pool: PgPool) {
        let state = create_test_state(pool.clone()).await;

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
