//! Authentication for the Tarifador API
//!
//! Three pieces: [`PasswordService`] hashes and checks credentials with
//! Argon2id, [`JwtService`] issues and validates the HS256 access tokens,
//! and [`AuthenticatedUser`] is the Actix extractor that gates routes on
//! a valid token (Bearer header or `token` cookie).
//!
//! # Examples
//!
//! ```no_run
//! use tarifador_auth::{JwtService, PasswordService};
//! use uuid::Uuid;
//!
//! let passwords = PasswordService::new();
//! let stored_hash = passwords.hash_password("s3nha")?;
//! assert!(passwords.verify_password("s3nha", &stored_hash)?);
//!
//! let tokens = JwtService::new("signing-secret", 1800);
//! let access_token = tokens.create_token_for_user("mariazinha", Uuid::new_v4())?;
//! let claims = tokens.validate_token(&access_token)?;
//! assert_eq!(claims.sub, "mariazinha");
//! # Ok::<(), tarifador_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::AuthenticatedUser;
pub use password::PasswordService;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // The register-then-login sequence the API runs, minus HTTP
    #[test]
    fn test_credential_to_token_flow() {
        let passwords = PasswordService::new();
        let tokens = JwtService::new("flow-test-secret", 1800);

        let stored = passwords.hash_password("senha123").unwrap();

        assert!(!passwords.verify_password("senha999", &stored).unwrap());
        assert!(passwords.verify_password("senha123", &stored).unwrap());

        let user_id = Uuid::new_v4();
        let token = tokens.create_token_for_user("mariazinha", user_id).unwrap();
        let claims = tokens.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "mariazinha");
        assert_eq!(claims.uid, user_id);
    }
}
