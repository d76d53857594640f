use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The generic rejection message for both bad credentials and a missing or
/// invalid session. Both cases must read identically to the client so that
/// failed logins never reveal whether the username exists.
pub const REJECTION_MESSAGE: &str = "You shall not pass!";

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A database pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A pool construction error.
    #[error("Pool build error: {0}")]
    PoolBuild(#[from] deadpool_postgres::CreatePoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Bad username or password. Deliberately carries no detail about which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No valid session on a protected route.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A stored password hash could not be parsed. Indicates data
    /// corruption, never user error.
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// A row came back without an expected column.
    #[error("Missing column in row: {0}")]
    MissingColumn(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::PoolBuild(ref e) => {
                tracing::error!("Pool build error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Login rejected");
                (StatusCode::UNAUTHORIZED, REJECTION_MESSAGE.to_string())
            }

            AppError::Unauthenticated => {
                tracing::debug!("No valid session on protected route");
                (StatusCode::UNAUTHORIZED, REJECTION_MESSAGE.to_string())
            }

            AppError::MalformedHash(ref msg) => {
                // Operator signal: a stored hash that no longer parses means
                // the users table is corrupt.
                tracing::error!("Corrupt password hash in store: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::MissingColumn(ref col) => {
                tracing::error!("Row missing column: {}", col);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "message": message
        }))
        .unwrap_or_else(|_| r#"{"message":"Internal server error"}"#.to_string());

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_and_unauthenticated_map_to_401() {
        assert_eq!(
            AppError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        let resp = AppError::MalformedHash("bad version".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_400() {
        let resp = AppError::Validation("too short".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_responses_are_typed_as_json() {
        let resp = AppError::Unauthenticated.into_response();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
