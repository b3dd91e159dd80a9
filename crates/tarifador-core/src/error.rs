//! Error type shared across the workspace
//!
//! One enum covers every failure the API surfaces. Each variant knows its
//! HTTP status and a stable machine-readable code; the `ResponseError`
//! impl renders the trio as the JSON error body.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Every failure the application can answer a request with
///
/// Message texts for the rating variants are part of the API contract
/// and are asserted by tests; change them deliberately.
#[derive(Error, Debug)]
pub enum AppError {
    // Rating
    #[error("The phone number '{0}' is invalid.")]
    InvalidPhoneNumber(String),

    #[error("Start call record with ID {0} was not found.")]
    StartRecordNotFound(i64),

    #[error("The reference period format is invalid. Use M/YYYY or MM/YYYY.")]
    InvalidReferencePeriod,

    #[error("Validation error: {0}")]
    Validation(String),

    // Accounts and tokens
    #[error("User '{0}' was not found.")]
    UserNotFound(String),

    #[error("User '{0}' already exists.")]
    UserAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // Storage
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // Plumbing
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        use AppError::*;

        match self {
            InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
            Validation(_) | InvalidReferencePeriod => StatusCode::UNPROCESSABLE_ENTITY,
            StartRecordNotFound(_) | UserNotFound(_) => StatusCode::NOT_FOUND,
            UserAlreadyExists(_) => StatusCode::CONFLICT,
            InvalidCredentials | TokenExpired | InvalidToken(_) | Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Database(_) | Pool(_) | Transaction(_) | PasswordHash(_) | Config(_)
            | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for the JSON error body
    pub fn error_code(&self) -> &'static str {
        use AppError::*;

        match self {
            InvalidPhoneNumber(_) => "invalid_phone_number",
            StartRecordNotFound(_) => "start_record_not_found",
            InvalidReferencePeriod => "invalid_reference_period",
            Validation(_) => "validation_error",
            UserNotFound(_) => "user_not_found",
            UserAlreadyExists(_) => "user_already_exists",
            InvalidCredentials => "invalid_credentials",
            TokenExpired => "token_expired",
            InvalidToken(_) => "invalid_token",
            Unauthorized(_) => "unauthorized",
            PasswordHash(_) => "password_error",
            Database(_) => "database_error",
            Pool(_) => "pool_error",
            Transaction(_) => "transaction_error",
            Config(_) => "config_error",
            Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = AppError::status_code(self);

        HttpResponse::build(status).json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}
