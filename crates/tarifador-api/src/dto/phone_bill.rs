//! Phone bill DTOs
//!
//! Read-side shapes for the bill lookup endpoint. Prices are rendered as
//! BRL strings so the payload matches the printed bill.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tarifador_core::models::{BilledCall, PhoneBill, ReferencePeriod};
use validator::Validate;

/// Query parameters for the bill lookup endpoint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhoneBillQuery {
    /// Subscriber number, with or without formatting
    #[validate(length(min = 1, message = "phone_number must not be empty"))]
    pub phone_number: String,

    /// Reference period as `M/YYYY` or `MM/YYYY`; defaults to the
    /// previous month when omitted
    pub reference_period: Option<String>,
}

/// One priced call on a bill
#[derive(Debug, Clone, Serialize)]
pub struct BilledCallDto {
    /// Number that was called
    pub destination: String,

    /// Date the call started
    pub call_start_date: NaiveDate,

    /// Time of day the call started
    pub call_start_time: NaiveTime,

    /// Rendered duration, e.g. `0h35m42s`
    pub call_duration: String,

    /// Price in BRL, e.g. `R$ 3,96`
    pub call_price: String,
}

impl From<BilledCall> for BilledCallDto {
    fn from(call: BilledCall) -> Self {
        let call_price = call.formatted_price();
        Self {
            destination: call.destination.into_string(),
            call_start_date: call.start_date,
            call_start_time: call.start_time,
            call_duration: call.duration,
            call_price,
        }
    }
}

/// A subscriber's bill for one reference period
#[derive(Debug, Clone, Serialize)]
pub struct PhoneBillResponse {
    /// Subscriber the bill belongs to
    pub phone_number: String,

    /// Billing period, rendered as `MM/YYYY`
    pub reference_period: ReferencePeriod,

    /// Bill total in BRL
    pub total_amount: String,

    /// Priced calls on the bill
    pub call_records: Vec<BilledCallDto>,
}

impl From<PhoneBill> for PhoneBillResponse {
    fn from(bill: PhoneBill) -> Self {
        let total_amount = bill.formatted_total();
        Self {
            phone_number: bill.phone_number.into_string(),
            reference_period: bill.reference_period,
            total_amount,
            call_records: bill.calls.into_iter().map(BilledCallDto::from).collect(),
        }
    }
}

/// Bill list wrapper returned by the lookup endpoint
///
/// A lookup finds at most one bill; an unknown subscriber or period
/// yields an empty list rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct PhoneBillListResponse {
    /// Bills matching the query
    pub bills: Vec<PhoneBillResponse>,
}

impl From<Option<PhoneBill>> for PhoneBillListResponse {
    fn from(bill: Option<PhoneBill>) -> Self {
        Self {
            bills: bill.map(PhoneBillResponse::from).into_iter().collect(),
        }
    }
}
