use crate::db::errors::DbError;
use crate::db::models::bookings::BookingStatus;
use crate::payments::PaymentError;
use crate::types::Operation;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Actor lacks the required permission for the operation
    #[error("Insufficient permissions to {action} {resource}")]
    InsufficientPermissions { action: Operation, resource: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Status precondition violated; echoes the current status for diagnostics
    #[error("{message}")]
    Conflict {
        message: String,
        current_status: Option<BookingStatus>,
    },

    /// Expired or already-consumed token
    #[error("{message}")]
    Gone { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Payment processor error
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            // Status preconditions report 400, not 409: the client sent a
            // request that is invalid for the booking's current state
            Error::Conflict { .. } => StatusCode::BAD_REQUEST,
            Error::Gone { .. } => StatusCode::GONE,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Payment(err) => err.status_code(),
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { action, resource } => {
                format!("Insufficient permissions to {action} {resource}")
            }
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::Conflict { message, .. } => message.clone(),
            Error::Gone { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    (Some("bookings"), Some("bookings_reference_unique")) => {
                        "Could not allocate a unique booking reference, please retry".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            // Processor details stay server-side; the log line carries the cause
            Error::Payment(err) => err.user_message(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Payment(err) => {
                tracing::error!("Payment processor error: {:#}", err);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::Gone { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { current_status, .. } => {
                tracing::debug!(?current_status, "Status precondition violated: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Conflicts get a structured body so clients can see the current status
            Error::Conflict { message, current_status } => {
                use serde_json::json;
                let body = json!({
                    "message": message,
                    "current_status": current_status,
                });
                (status, axum::response::Json(body)).into_response()
            }
            // For all other errors, return a plain text message
            _ => (status, self.user_message()).into_response(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED),
            (
                Error::InsufficientPermissions {
                    action: Operation::Accept,
                    resource: "booking".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::NotFound {
                    resource: "Booking".to_string(),
                    id: "BK-ABC".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::Conflict {
                    message: "Booking already processed".to_string(),
                    current_status: Some(BookingStatus::Confirmed),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::Gone {
                    message: "This access link has expired".to_string(),
                },
                StatusCode::GONE,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "wrong status for {error:?}");
        }
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let error = Error::Internal {
            operation: "connect to stripe with key sk_live_secret".to_string(),
        };
        assert_eq!(error.user_message(), "Internal server error");
    }
}
