//! Domain models for Tarifador
//!
//! This module contains all the core domain models used throughout the application.

pub mod call_record;
pub mod period;
pub mod phone;
pub mod phone_bill;
pub mod tariff;
pub mod user;

pub use call_record::{CallPair, CallRecord, CallType};
pub use period::ReferencePeriod;
pub use phone::PhoneNumber;
pub use phone_bill::{BilledCall, PhoneBill};
pub use tariff::Tariff;
pub use user::User;
