//! Business logic services for Tarifador
//!
//! The reconciler ingests call legs and settles completed pairs onto
//! bills; the billing service owns bill lookups and all bill mutations.
//! Services are plain structs, generic over the persistence traits in
//! `tarifador_core::traits`, meant to be wrapped in `Arc` and shared
//! across workers.

pub mod billing;
pub mod lock;
pub mod reconciler;

pub use billing::BillingService;
pub use lock::LockRegistry;
pub use reconciler::CallReconciler;
