//! Password hashing

use argon2::password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::{password_hash::SaltString, Argon2};
use rand_core::OsRng;
use tarifador_core::error::AppError;
use tracing::error;

/// Hashes and checks user passwords with Argon2id
///
/// Every hash gets a fresh random salt and is stored as a PHC string,
/// so two hashes of the same password never match each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordService;

impl PasswordService {
    /// Create the service
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password into a PHC string
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHash` if Argon2 fails.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "Argon2 hashing failed");
                AppError::PasswordHash(e.to_string())
            })?;

        Ok(hash.to_string())
    }

    /// Check a plaintext password against a stored PHC string
    ///
    /// A mismatch is `Ok(false)`, not an error; only an unreadable
    /// stored hash or an internal Argon2 failure is an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHash` in those two cases.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(stored).map_err(|e| {
            error!(error = %e, "Stored password hash is not a readable PHC string");
            AppError::PasswordHash(format!("unreadable stored hash: {}", e))
        })?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "Argon2 verification failed");
                Err(AppError::PasswordHash(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let service = PasswordService::new();
        let hash = service.hash_password("s3nha-segura").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(service.verify_password("s3nha-segura", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_is_false_not_an_error() {
        let service = PasswordService::new();
        let hash = service.hash_password("certa").unwrap();

        assert!(!service.verify_password("errada", &hash).unwrap());
    }

    #[test]
    fn test_same_password_salts_differently() {
        let service = PasswordService::new();

        let first = service.hash_password("repetida").unwrap();
        let second = service.hash_password("repetida").unwrap();
        assert_ne!(first, second);

        assert!(service.verify_password("repetida", &first).unwrap());
        assert!(service.verify_password("repetida", &second).unwrap());
    }

    #[test]
    fn test_unreadable_stored_hash_is_an_error() {
        let service = PasswordService::new();

        assert!(matches!(
            service.verify_password("qualquer", "plainly-not-phc"),
            Err(AppError::PasswordHash(_))
        ));
    }

    #[test]
    fn test_empty_password_still_round_trips() {
        let service = PasswordService::default();
        let hash = service.hash_password("").unwrap();

        assert!(service.verify_password("", &hash).unwrap());
        assert!(!service.verify_password("x", &hash).unwrap());
    }
}
