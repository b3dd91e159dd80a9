//! Call leg reconciliation
//!
//! Accepts start and end legs in any order and any number of times,
//! stores them idempotently, and settles the pair onto a bill the moment
//! both legs are known. Submissions for the same call are serialized
//! through a per-call lock, so concurrent legs cannot race each other
//! into billing a call twice.

use crate::billing::BillingService;
use crate::lock::LockRegistry;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tarifador_core::models::{CallPair, CallRecord, CallType};
use tarifador_core::traits::{CallRecordStore, PhoneBillStore};
use tarifador_core::{AppError, AppResult};
use tracing::{debug, info, instrument};

/// Ingests call legs and drives completed pairs through billing
pub struct CallReconciler<C: CallRecordStore, B: PhoneBillStore> {
    records: Arc<C>,
    billing: Arc<BillingService<B>>,
    locks: LockRegistry<i64>,
}

impl<C: CallRecordStore, B: PhoneBillStore> CallReconciler<C, B> {
    /// Create a new reconciler
    pub fn new(records: Arc<C>, billing: Arc<BillingService<B>>) -> Self {
        Self {
            records,
            billing,
            locks: LockRegistry::new(),
        }
    }

    /// Submit one call leg
    ///
    /// A leg already on file for this (call, type) is updated in place; a
    /// repeated submission after the pair was billed reprices the bill.
    /// An end leg whose start was never seen is rejected and not stored.
    /// Returns the stored leg, linked to its bill if the pair completed.
    #[instrument(skip(self, source, destination))]
    pub async fn submit(
        &self,
        call_id: i64,
        call_type: CallType,
        timestamp: DateTime<Utc>,
        source: Option<String>,
        destination: Option<String>,
    ) -> AppResult<CallRecord> {
        // Validation happens outside the lock; only storage and settling
        // need to be serialized
        let record = CallRecord::new(call_id, call_type, timestamp, source, destination)?;

        let lock = self.locks.lock_for(&call_id);
        let guard = lock.lock().await;
        let result = self.store_and_settle(record).await;
        drop(guard);
        self.locks.release(&call_id);

        result
    }

    async fn store_and_settle(&self, record: CallRecord) -> AppResult<CallRecord> {
        let call_id = record.call_id;

        // An end leg is only meaningful once its start has been seen, and
        // is never stored without one
        if record.is_end() && !self.records.start_exists(call_id).await? {
            info!(call_id, "Rejected end leg with no start on file");
            return Err(AppError::StartRecordNotFound(call_id));
        }

        let mut stored = if self.records.exists(call_id, record.call_type).await? {
            debug!(call_id, call_type = %record.call_type, "Updating leg already on file");
            self.records.update(&record).await?
        } else {
            self.records.save(&record).await?
        };

        let (start, end) = self.records.get_pair(call_id).await?;
        if let (Some(start), Some(end)) = (start, end) {
            let pair = CallPair::new(start, end);
            let bill = self.billing.bill_pair(&pair).await?;
            self.records
                .link_to_bill(pair.start.id, pair.end.id, bill.id)
                .await?;
            stored.phone_bill_id = Some(bill.id);
            info!(call_id, bill_id = %bill.id, "Call settled onto bill");
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tarifador_core::models::{ReferencePeriod, Tariff};
    use tarifador_db::{InMemoryCallRecordStore, InMemoryPhoneBillStore};

    type TestReconciler = CallReconciler<InMemoryCallRecordStore, InMemoryPhoneBillStore>;

    fn setup() -> (
        TestReconciler,
        Arc<InMemoryCallRecordStore>,
        Arc<InMemoryPhoneBillStore>,
    ) {
        let records = Arc::new(InMemoryCallRecordStore::new());
        let bills = Arc::new(InMemoryPhoneBillStore::new());
        let billing = Arc::new(BillingService::new(bills.clone(), Tariff::default()));
        (
            CallReconciler::new(records.clone(), billing),
            records,
            bills,
        )
    }

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    async fn submit_start(reconciler: &TestReconciler, call_id: i64, at: &str) -> CallRecord {
        reconciler
            .submit(
                call_id,
                CallType::Start,
                ts(at),
                Some("99988526423".to_string()),
                Some("9933468278".to_string()),
            )
            .await
            .unwrap()
    }

    async fn submit_end(reconciler: &TestReconciler, call_id: i64, at: &str) -> CallRecord {
        reconciler
            .submit(call_id, CallType::End, ts(at), None, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_then_end_settles_the_call() {
        let (reconciler, records, bills) = setup();

        let start = submit_start(&reconciler, 70, "2016-02-29T12:00:00").await;
        assert!(start.phone_bill_id.is_none());

        let end = submit_end(&reconciler, 70, "2016-02-29T14:00:00").await;
        let bill_id = end.phone_bill_id.unwrap();

        let bill = bills.get_by_id(bill_id).await.unwrap().unwrap();
        assert_eq!(bill.phone_number.as_str(), "99988526423");
        assert_eq!(bill.calls.len(), 1);
        assert_eq!(bill.calls[0].duration, "2h0m0s");
        assert_eq!(bill.total_amount, dec!(11.16));
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_end_without_start_is_rejected_and_not_stored() {
        let (reconciler, records, bills) = setup();

        let err = reconciler
            .submit(99, CallType::End, ts("2016-02-29T14:00:00"), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StartRecordNotFound(99)));
        assert!(records.is_empty());
        assert!(bills.is_empty());
    }

    #[tokio::test]
    async fn test_lone_start_does_not_bill() {
        let (reconciler, records, bills) = setup();

        submit_start(&reconciler, 70, "2016-02-29T12:00:00").await;

        assert_eq!(records.len(), 1);
        assert!(bills.is_empty());
    }

    #[tokio::test]
    async fn test_resubmitting_a_leg_updates_it_in_place() {
        let (reconciler, records, _bills) = setup();

        let first = submit_start(&reconciler, 70, "2016-02-29T12:00:00").await;
        let second = submit_start(&reconciler, 70, "2016-02-29T12:05:00").await;

        assert_eq!(second.id, first.id);
        assert_eq!(second.timestamp, ts("2016-02-29T12:05:00"));
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_update_after_completion_reprices_the_bill() {
        let (reconciler, _records, bills) = setup();

        submit_start(&reconciler, 1, "2023-11-01T10:00:00").await;
        let completed = submit_end(&reconciler, 1, "2023-11-01T10:30:00").await;
        let bill_id = completed.phone_bill_id.unwrap();

        // The hangup actually happened 15 minutes later
        let corrected = submit_end(&reconciler, 1, "2023-11-01T10:45:00").await;
        assert_eq!(corrected.phone_bill_id, Some(bill_id));

        let bill = bills.get_by_id(bill_id).await.unwrap().unwrap();
        assert_eq!(bill.calls.len(), 1);
        assert_eq!(bill.calls[0].duration, "0h45m0s");
        assert_eq!(bill.total_amount, dec!(4.41));
        assert_eq!(bills.len(), 1);
    }

    #[tokio::test]
    async fn test_each_period_gets_its_own_bill() {
        let (reconciler, _records, bills) = setup();

        submit_start(&reconciler, 1, "2023-11-10T10:00:00").await;
        submit_end(&reconciler, 1, "2023-11-10T10:05:00").await;

        submit_start(&reconciler, 2, "2023-12-10T10:00:00").await;
        submit_end(&reconciler, 2, "2023-12-10T10:05:00").await;

        assert_eq!(bills.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_leg_is_rejected_before_storage() {
        let (reconciler, records, _bills) = setup();

        let err = reconciler
            .submit(
                5,
                CallType::Start,
                ts("2023-11-01T10:00:00"),
                Some("99988526423".to_string()),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_reference_traffic_is_split_and_priced_per_month() {
        let (reconciler, _records, bills) = setup();

        let traffic = [
            (70, "2016-02-29T12:00:00", "2016-02-29T14:00:00"),
            (71, "2017-12-11T15:07:13", "2017-12-11T15:14:56"),
            (72, "2017-12-12T22:47:56", "2017-12-12T22:50:56"),
            (73, "2017-12-12T21:57:13", "2017-12-12T22:10:56"),
            (74, "2017-12-12T04:57:13", "2017-12-12T06:10:56"),
            (75, "2017-12-13T21:57:13", "2017-12-14T22:10:56"),
            (76, "2017-12-12T15:07:58", "2017-12-12T15:12:56"),
            (77, "2018-02-28T21:57:13", "2018-03-01T22:10:56"),
        ];
        for (call_id, start, end) in traffic {
            submit_start(&reconciler, call_id, start).await;
            submit_end(&reconciler, call_id, end).await;
        }

        // The period comes from the end leg, so the eight calls land on
        // three monthly bills
        assert_eq!(bills.len(), 3);

        let february = ReferencePeriod::parse("02/2016").unwrap();
        let bill = bills.get("99988526423", &february).await.unwrap().unwrap();
        assert_eq!(bill.calls.len(), 1);
        assert_eq!(bill.calls[0].duration, "2h0m0s");
        assert_eq!(bill.total_amount, dec!(11.16));

        let december = ReferencePeriod::parse("12/2017").unwrap();
        let bill = bills.get("99988526423", &december).await.unwrap().unwrap();
        assert_eq!(bill.calls.len(), 6);
        let ids: Vec<i64> = bill.calls.iter().map(|c| c.call_id).collect();
        assert_eq!(ids, vec![71, 72, 73, 74, 75, 76]);
        let prices: Vec<Decimal> = bill.calls.iter().map(|c| c.price).collect();
        assert_eq!(
            prices,
            vec![
                dec!(0.99),
                dec!(0.36),
                dec!(0.54),
                dec!(1.17),
                dec!(86.76),
                dec!(0.72)
            ]
        );
        assert_eq!(bill.calls[4].duration, "24h13m43s");
        assert_eq!(bill.total_amount, dec!(90.54));
        assert_eq!(bill.formatted_total(), "R$ 90,54");

        let march = ReferencePeriod::parse("03/2018").unwrap();
        let bill = bills.get("99988526423", &march).await.unwrap().unwrap();
        assert_eq!(bill.calls.len(), 1);
        assert_eq!(bill.total_amount, dec!(86.76));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_bill_without_losing_lines() {
        let (reconciler, records, bills) = setup();
        let reconciler = Arc::new(reconciler);

        let mut handles = Vec::new();
        for call_id in 1..=4 {
            let reconciler = reconciler.clone();
            handles.push(tokio::spawn(async move {
                submit_start(&reconciler, call_id, "2023-11-01T10:00:00").await;
                submit_end(&reconciler, call_id, "2023-11-01T10:30:00").await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(records.len(), 8);
        assert_eq!(bills.len(), 1);

        let period = ReferencePeriod::parse("11/2023").unwrap();
        let bill = bills.get("99988526423", &period).await.unwrap().unwrap();
        assert_eq!(bill.calls.len(), 4);
        assert_eq!(bill.total_amount, dec!(12.24));
    }
}
