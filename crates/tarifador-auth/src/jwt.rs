//! Access token issuing and validation

use crate::claims::Claims;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tarifador_core::error::AppError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Issues and checks the HS256-signed tokens the API hands out
///
/// Expiry is enforced with zero leeway, so a token is rejected the
/// moment its `exp` instant passes.
#[derive(Clone)]
pub struct JwtService {
    expiration_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Service signing with `secret`; issued tokens live `expiration_secs`
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            expiration_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for a user
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidToken` if signing fails.
    pub fn create_token_for_user(
        &self,
        username: &str,
        user_id: Uuid,
    ) -> Result<String, AppError> {
        let claims = Claims::new(username, user_id, self.expiration_secs);
        debug!(username, exp = claims.exp, "Issuing access token");

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InvalidToken(format!("token signing failed: {}", e)))
    }

    /// Decode a token and verify its signature and expiry
    ///
    /// # Errors
    ///
    /// `AppError::TokenExpired` for a lapsed token, `AppError::InvalidToken`
    /// for anything else wrong with it.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    warn!("Rejected expired token");
                    AppError::TokenExpired
                }
                _ => {
                    warn!(error = %e, "Rejected invalid token");
                    AppError::InvalidToken(e.to_string())
                }
            }
        })?;

        Ok(data.claims)
    }

    /// Lifetime given to issued tokens, in seconds
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_secs", &self.expiration_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
