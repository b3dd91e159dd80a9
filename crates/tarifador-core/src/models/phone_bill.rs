//! Phone bill model
//!
//! One bill per (subscriber, reference period). The bill owns its priced
//! call lines and a running total; lines are appended when a pair
//! completes and replaced in place when a leg update forces a reprice.

use crate::error::AppError;
use crate::models::call_record::CallPair;
use crate::models::period::ReferencePeriod;
use crate::models::phone::PhoneNumber;
use crate::models::tariff::Tariff;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Render a monetary amount as Brazilian currency, e.g. `R$ 0,36`
pub fn format_brl(value: Decimal) -> String {
    format!("R$ {:.2}", value).replace('.', ",")
}

/// One priced call on a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilledCall {
    /// Call this line was priced from, kept so a reprice can find it
    pub call_id: i64,

    /// Number that was called
    pub destination: PhoneNumber,

    /// Calendar date the call started
    pub start_date: NaiveDate,

    /// Wall-clock time the call started
    pub start_time: NaiveTime,

    /// Elapsed time, rendered as "HhMmSs"
    pub duration: String,

    /// Price charged for the call
    pub price: Decimal,
}

impl BilledCall {
    /// Price a completed pair into a bill line
    pub fn from_pair(pair: &CallPair, tariff: &Tariff) -> Result<Self, AppError> {
        let destination = pair.start.destination.clone().ok_or_else(|| {
            AppError::Internal(format!(
                "start record for call {} has no destination",
                pair.call_id()
            ))
        })?;

        Ok(Self {
            call_id: pair.call_id(),
            destination,
            start_date: pair.start.timestamp.date_naive(),
            start_time: pair.start.timestamp.time(),
            duration: Tariff::duration(&pair.start.timestamp, &pair.end.timestamp),
            price: tariff.cost(&pair.start.timestamp, &pair.end.timestamp),
        })
    }

    /// The price in display form
    pub fn formatted_price(&self) -> String {
        format_brl(self.price)
    }
}

/// A subscriber's bill for one reference period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneBill {
    /// Unique identifier
    pub id: Uuid,

    /// Subscriber the bill belongs to
    pub phone_number: PhoneNumber,

    /// Calendar month the bill covers
    pub reference_period: ReferencePeriod,

    /// Priced calls, in completion order
    pub calls: Vec<BilledCall>,

    /// Running total of all call prices
    pub total_amount: Decimal,
}

impl PhoneBill {
    /// Create an empty bill for a (subscriber, period) key
    pub fn new(phone_number: PhoneNumber, reference_period: ReferencePeriod) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number,
            reference_period,
            calls: Vec::new(),
            total_amount: Decimal::ZERO,
        }
    }

    /// Append a priced call and add it to the total
    pub fn add_call(&mut self, call: BilledCall) {
        self.total_amount += call.price;
        self.calls.push(call);
    }

    /// Replace the line for `call.call_id` in place, adjusting the total
    /// by the price delta
    ///
    /// Line order is preserved. Returns the replaced line's price, or
    /// `None` if no line for that call exists on this bill.
    pub fn replace_call(&mut self, call: BilledCall) -> Option<Decimal> {
        let position = self.calls.iter().position(|c| c.call_id == call.call_id)?;

        let old_price = self.calls[position].price;
        self.total_amount = self.total_amount - old_price + call.price;
        self.calls[position] = call;

        Some(old_price)
    }

    /// The running total in display form
    pub fn formatted_total(&self) -> String {
        format_brl(self.total_amount)
    }
}
