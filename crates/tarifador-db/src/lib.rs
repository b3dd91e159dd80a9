//! Database layer for Tarifador
//!
//! Provides PostgreSQL-backed implementations of the core storage traits,
//! connection pool management, and in-memory doubles used by service tests.

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::{InMemoryCallRecordStore, InMemoryPhoneBillStore, InMemoryUserStore};
pub use pool::{create_pool, create_pool_with_options};
pub use repositories::{PgCallRecordStore, PgPhoneBillStore, PgUserStore};

// Re-export commonly used types
pub use sqlx::{PgPool, Postgres, Transaction};
pub use tarifador_core::{AppError, AppResult};
