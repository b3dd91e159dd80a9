//! Authentication DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username for the new account
    #[validate(length(
        min = 3,
        max = 100,
        message = "Username must be between 3 and 100 characters"
    ))]
    pub username: String,

    /// Password for the new account
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Registration response
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    /// Id of the created user
    pub id: Uuid,

    /// Username of the created user
    pub username: String,
}

/// Credentials presented to the token endpoint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TokenRequest {
    /// Username to authenticate as
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password to authenticate with
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Issued token response
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// Signed JWT access token
    pub access_token: String,

    /// Token type, always `bearer`
    pub token_type: String,

    /// Id of the authenticated user
    pub user_id: Uuid,

    /// Username of the authenticated user
    pub username: String,
}

impl TokenResponse {
    /// Build a response around a freshly issued token
    pub fn new(access_token: String, user_id: Uuid, username: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user_id,
            username,
        }
    }
}
