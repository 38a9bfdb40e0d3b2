use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials did not match a stored user. Covers both "no such user"
    /// and "wrong password" with one message.
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    /// An access token that failed signature or shape checks, or was revoked.
    #[error("Invalid access token")]
    TokenInvalid,

    /// An access token past its expiry.
    #[error("Access token expired")]
    TokenExpired,

    /// A refresh token that failed signature or shape checks, or was revoked.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// A refresh token past its expiry.
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// The principal referenced by a verified refresh token no longer exists
    /// (or is deactivated).
    #[error("User not found")]
    UserNotFound,

    /// A missing or malformed bearer credential.
    #[error("Authentication required")]
    Unauthorized,

    /// An authorization (role) failure.
    #[error("Forbidden")]
    Forbidden,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A uniqueness conflict (username/email already taken).
    #[error("Conflict: {0}")]
    Conflict(String),

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

            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Login failed: invalid credentials");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::TokenInvalid | AppError::TokenExpired => {
                tracing::debug!("Access token rejected: {}", self);
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::InvalidRefreshToken
            | AppError::RefreshTokenExpired
            | AppError::UserNotFound => {
                tracing::warn!("Refresh failed: {}", self);
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::Unauthorized => {
                tracing::debug!("Missing or malformed bearer credential");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::Forbidden => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
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
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
