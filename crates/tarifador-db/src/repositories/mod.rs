//! Repository implementations
//!
//! PostgreSQL-backed implementations of the storage traits defined in
//! `tarifador-core`. All queries are runtime queries (not compile-time
//! macros) so the workspace builds without a database connection.

pub mod call_record_repo;
pub mod phone_bill_repo;
pub mod user_repo;

pub use call_record_repo::PgCallRecordStore;
pub use phone_bill_repo::PgPhoneBillStore;
pub use user_repo::PgUserStore;

use tarifador_core::models::PhoneNumber;
use tarifador_core::AppError;

/// Rehydrate a phone number column that was normalized before it was stored.
///
/// A failure here means the row predates the current normalization rules or
/// was written by hand, so it surfaces as a database error rather than a
/// client-facing validation error.
pub(crate) fn stored_number(value: &str) -> Result<PhoneNumber, AppError> {
    PhoneNumber::normalize(value).map_err(|_| {
        AppError::Database(format!("Stored phone number '{}' is not canonical", value))
    })
}
