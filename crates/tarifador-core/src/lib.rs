//! Tarifador Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Tarifador call-rating system. It includes:
//!
//! - Domain models (CallRecord, PhoneBill, Tariff, etc.)
//! - Repository traits for the persistence seams
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
