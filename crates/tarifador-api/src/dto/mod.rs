//! Data Transfer Objects for API requests and responses

pub mod auth;
pub mod call_record;
pub mod phone_bill;

pub use auth::*;
pub use call_record::*;
pub use phone_bill::*;
