//! HTTP request handlers

pub mod auth;
pub mod call_record;
pub mod phone_bill;

pub use auth::configure as configure_auth;
pub use call_record::configure as configure_call_records;
pub use phone_bill::configure as configure_phone_bills;
