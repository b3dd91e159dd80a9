//! Bill maintenance
//!
//! Prices completed call pairs onto monthly bills, one bill per
//! (subscriber, reference period), opened on first use. A pair whose legs
//! were already billed is repriced in place on its original bill, even
//! when the corrected timestamps would now land in a different period.

use crate::lock::LockRegistry;
use chrono::Utc;
use std::sync::Arc;
use tarifador_core::models::phone::strip_formatting;
use tarifador_core::models::{BilledCall, CallPair, PhoneBill, PhoneNumber, ReferencePeriod, Tariff};
use tarifador_core::traits::PhoneBillStore;
use tarifador_core::{AppError, AppResult};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Bills are serialized on their (subscriber, period) identity
type BillKey = (String, String);

/// Maintains phone bills as call pairs complete and answers bill queries
///
/// All mutations of one bill go through a per-bill lock, so pairs for the
/// same subscriber completing on different workers cannot lose each
/// other's lines.
pub struct BillingService<B: PhoneBillStore> {
    bills: Arc<B>,
    tariff: Tariff,
    locks: LockRegistry<BillKey>,
}

impl<B: PhoneBillStore> BillingService<B> {
    /// Create a new billing service
    pub fn new(bills: Arc<B>, tariff: Tariff) -> Self {
        Self {
            bills,
            tariff,
            locks: LockRegistry::new(),
        }
    }

    /// Price a completed pair onto the subscriber's bill
    ///
    /// Returns the bill the call now lives on, so the caller can link the
    /// legs to it. Either leg remembering a bill means the pair was billed
    /// before and gets repriced instead of billed again.
    #[instrument(skip(self, pair))]
    pub async fn bill_pair(&self, pair: &CallPair) -> AppResult<PhoneBill> {
        if let Some(bill_id) = pair.end.phone_bill_id.or(pair.start.phone_bill_id) {
            return self.reprice(bill_id, pair).await;
        }

        let subscriber = pair.start.source.clone().ok_or_else(|| {
            AppError::Internal(format!(
                "start record for call {} has no source",
                pair.call_id()
            ))
        })?;
        let period = ReferencePeriod::from_timestamp(&pair.end.timestamp);
        let key = (subscriber.as_str().to_string(), period.to_string());

        let lock = self.locks.lock_for(&key);
        let guard = lock.lock().await;
        let result = self.settle_line(subscriber, period, pair).await;
        drop(guard);
        self.locks.release(&key);

        result
    }

    /// Append the pair's line to the open bill, opening one if needed
    async fn settle_line(
        &self,
        subscriber: PhoneNumber,
        period: ReferencePeriod,
        pair: &CallPair,
    ) -> AppResult<PhoneBill> {
        let line = BilledCall::from_pair(pair, &self.tariff)?;

        match self.bills.get(subscriber.as_str(), &period).await? {
            Some(mut bill) => {
                bill.add_call(line);
                let bill = self.bills.update(&bill).await?;
                info!(
                    call_id = pair.call_id(),
                    bill_id = %bill.id,
                    total = %bill.total_amount,
                    "Appended call to bill"
                );
                Ok(bill)
            }
            None => {
                let mut bill = PhoneBill::new(subscriber, period);
                bill.add_call(line);
                let bill = self.bills.save(&bill).await?;
                info!(
                    call_id = pair.call_id(),
                    bill_id = %bill.id,
                    period = %period,
                    "Opened bill"
                );
                Ok(bill)
            }
        }
    }

    /// Reprice an already-billed pair after one of its legs changed
    ///
    /// The bill key is only known after a first read; the authoritative
    /// read happens again under the bill lock.
    async fn reprice(&self, bill_id: Uuid, pair: &CallPair) -> AppResult<PhoneBill> {
        let bill = self.fetch_billed(bill_id, pair.call_id()).await?;
        let key = (
            bill.phone_number.as_str().to_string(),
            bill.reference_period.to_string(),
        );

        let lock = self.locks.lock_for(&key);
        let guard = lock.lock().await;
        let result = self.reprice_line(bill_id, pair).await;
        drop(guard);
        self.locks.release(&key);

        result
    }

    async fn reprice_line(&self, bill_id: Uuid, pair: &CallPair) -> AppResult<PhoneBill> {
        let mut bill = self.fetch_billed(bill_id, pair.call_id()).await?;
        let line = BilledCall::from_pair(pair, &self.tariff)?;

        match bill.replace_call(line.clone()) {
            Some(old_price) => {
                debug!(
                    call_id = pair.call_id(),
                    old_price = %old_price,
                    new_price = %line.price,
                    "Repriced bill line"
                );
            }
            None => {
                warn!(
                    call_id = pair.call_id(),
                    bill_id = %bill.id,
                    "Billed call has no line on its bill, appending one"
                );
                bill.add_call(line);
            }
        }

        let bill = self.bills.update(&bill).await?;
        info!(
            call_id = pair.call_id(),
            bill_id = %bill.id,
            total = %bill.total_amount,
            "Repriced call on bill"
        );
        Ok(bill)
    }

    async fn fetch_billed(&self, bill_id: Uuid, call_id: i64) -> AppResult<PhoneBill> {
        self.bills.get_by_id(bill_id).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "call {} is linked to bill {} which no longer exists",
                call_id, bill_id
            ))
        })
    }

    /// Look up a subscriber's bill
    ///
    /// The number is cleaned of formatting but not validated, so an
    /// unknown or malformed subscriber comes back as no bill rather than
    /// an error. A missing period defaults to the month before today.
    #[instrument(skip(self))]
    pub async fn find_bill(
        &self,
        phone_number: &str,
        period: Option<&str>,
    ) -> AppResult<Option<PhoneBill>> {
        let subscriber = strip_formatting(phone_number);
        let period = match period {
            Some(raw) => ReferencePeriod::parse(raw)?,
            None => ReferencePeriod::previous_month(Utc::now().date_naive()),
        };

        debug!(subscriber = %subscriber, period = %period, "Looking up bill");
        self.bills.get(&subscriber, &period).await
    }
}
