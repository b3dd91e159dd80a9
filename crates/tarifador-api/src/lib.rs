//! API layer for Tarifador
//!
//! HTTP handlers and DTOs for registering call records and reading
//! phone bills, plus the authentication endpoints that guard writes.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs
)]

pub mod dto;
pub mod handlers;

use tarifador_db::{PgCallRecordStore, PgPhoneBillStore};
use tarifador_services::{BillingService, CallReconciler};

/// Billing service wired to the PostgreSQL bill store.
///
/// Shared through app data so every worker uses the same per-bill locks.
pub type Billing = BillingService<PgPhoneBillStore>;

/// Call reconciler wired to the PostgreSQL stores.
///
/// Shared through app data so every worker uses the same per-call locks.
pub type Reconciler = CallReconciler<PgCallRecordStore, PgPhoneBillStore>;

// Re-export handler configuration functions
pub use handlers::{configure_auth, configure_call_records, configure_phone_bills};
