//! In-memory store implementations
//!
//! Process-local implementations of the storage traits, backed by maps
//! behind `parking_lot` locks. They mirror the semantics of the PostgreSQL
//! repositories and back the service unit tests, which should not need a
//! running database.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tarifador_core::{
    models::{CallRecord, CallType, PhoneBill, ReferencePeriod, User},
    traits::{CallRecordStore, PhoneBillStore, UserStore},
    AppError, AppResult,
};
use uuid::Uuid;

/// In-memory implementation of CallRecordStore
#[derive(Default)]
pub struct InMemoryCallRecordStore {
    records: RwLock<Vec<CallRecord>>,
}

impl InMemoryCallRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored legs, for test assertions
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl CallRecordStore for InMemoryCallRecordStore {
    async fn save(&self, record: &CallRecord) -> AppResult<CallRecord> {
        let mut records = self.records.write();
        if records
            .iter()
            .any(|r| r.call_id == record.call_id && r.call_type == record.call_type)
        {
            return Err(AppError::Database(format!(
                "Duplicate {} leg for call {}",
                record.call_type, record.call_id
            )));
        }
        records.push(record.clone());
        Ok(record.clone())
    }

    async fn exists(&self, call_id: i64, call_type: CallType) -> AppResult<bool> {
        Ok(self
            .records
            .read()
            .iter()
            .any(|r| r.call_id == call_id && r.call_type == call_type))
    }

    async fn start_exists(&self, call_id: i64) -> AppResult<bool> {
        self.exists(call_id, CallType::Start).await
    }

    async fn update(&self, record: &CallRecord) -> AppResult<CallRecord> {
        let mut records = self.records.write();
        let stored = records
            .iter_mut()
            .find(|r| r.call_id == record.call_id && r.call_type == record.call_type)
            .ok_or_else(|| {
                AppError::Database(format!(
                    "No {} leg stored for call {}",
                    record.call_type, record.call_id
                ))
            })?;

        stored.timestamp = record.timestamp;
        stored.source = record.source.clone();
        stored.destination = record.destination.clone();
        Ok(stored.clone())
    }

    async fn get_pair(
        &self,
        call_id: i64,
    ) -> AppResult<(Option<CallRecord>, Option<CallRecord>)> {
        let records = self.records.read();
        let start = records
            .iter()
            .find(|r| r.call_id == call_id && r.is_start())
            .cloned();
        let end = records
            .iter()
            .find(|r| r.call_id == call_id && r.is_end())
            .cloned();
        Ok((start, end))
    }

    async fn link_to_bill(
        &self,
        start_id: Uuid,
        end_id: Uuid,
        bill_id: Uuid,
    ) -> AppResult<()> {
        let mut records = self.records.write();
        for record in records.iter_mut() {
            if record.id == start_id || record.id == end_id {
                record.phone_bill_id = Some(bill_id);
            }
        }
        Ok(())
    }
}

/// In-memory implementation of PhoneBillStore
///
/// Keyed by (phone number, reference period), which is also the unique
/// constraint the PostgreSQL schema enforces.
#[derive(Default)]
pub struct InMemoryPhoneBillStore {
    bills: RwLock<HashMap<(String, String), PhoneBill>>,
}

impl InMemoryPhoneBillStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bills.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bills.read().is_empty()
    }
}

fn bill_key(bill: &PhoneBill) -> (String, String) {
    (
        bill.phone_number.as_str().to_string(),
        bill.reference_period.to_string(),
    )
}

#[async_trait]
impl PhoneBillStore for InMemoryPhoneBillStore {
    async fn get(
        &self,
        phone_number: &str,
        period: &ReferencePeriod,
    ) -> AppResult<Option<PhoneBill>> {
        let key = (phone_number.to_string(), period.to_string());
        Ok(self.bills.read().get(&key).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PhoneBill>> {
        Ok(self.bills.read().values().find(|b| b.id == id).cloned())
    }

    async fn exists_for(
        &self,
        period: &ReferencePeriod,
        phone_number: &str,
    ) -> AppResult<bool> {
        let key = (phone_number.to_string(), period.to_string());
        Ok(self.bills.read().contains_key(&key))
    }

    async fn save(&self, bill: &PhoneBill) -> AppResult<PhoneBill> {
        let mut bills = self.bills.write();
        let key = bill_key(bill);
        if bills.contains_key(&key) {
            return Err(AppError::Database(format!(
                "Bill already exists for {} in {}",
                bill.phone_number, bill.reference_period
            )));
        }
        bills.insert(key, bill.clone());
        Ok(bill.clone())
    }

    async fn update(&self, bill: &PhoneBill) -> AppResult<PhoneBill> {
        self.bills.write().insert(bill_key(bill), bill.clone());
        Ok(bill.clone())
    }
}

/// In-memory implementation of UserStore
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn save(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(AppError::UserAlreadyExists(user.username.clone()));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user.clone())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use tarifador_core::models::PhoneNumber;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn start_leg(call_id: i64, timestamp: &str) -> CallRecord {
        CallRecord::new(
            call_id,
            CallType::Start,
            ts(timestamp),
            Some("99988526423".to_string()),
            Some("9933468278".to_string()),
        )
        .unwrap()
    }

    fn end_leg(call_id: i64, timestamp: &str) -> CallRecord {
        CallRecord::new(call_id, CallType::End, ts(timestamp), None, None).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_exists() {
        let store = InMemoryCallRecordStore::new();
        let record = start_leg(70, "2017-12-12T15:07:13");

        store.save(&record).await.unwrap();

        assert!(store.exists(70, CallType::Start).await.unwrap());
        assert!(!store.exists(70, CallType::End).await.unwrap());
        assert!(store.start_exists(70).await.unwrap());
        assert!(!store.start_exists(71).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_leg() {
        let store = InMemoryCallRecordStore::new();
        store
            .save(&start_leg(70, "2017-12-12T15:07:13"))
            .await
            .unwrap();

        let err = store
            .save(&start_leg(70, "2017-12-12T16:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_overwrites_fields_and_keeps_id() {
        let store = InMemoryCallRecordStore::new();
        let original = store
            .save(&start_leg(70, "2017-12-12T15:07:13"))
            .await
            .unwrap();

        let replacement = start_leg(70, "2017-12-12T16:00:00");
        let updated = store.update(&replacement).await.unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.timestamp, ts("2017-12-12T16:00:00"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_leg_fails() {
        let store = InMemoryCallRecordStore::new();
        let err = store
            .update(&end_leg(70, "2017-12-12T15:37:13"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_get_pair_and_link() {
        let store = InMemoryCallRecordStore::new();
        let start = store
            .save(&start_leg(70, "2017-12-12T15:07:13"))
            .await
            .unwrap();
        let end = store
            .save(&end_leg(70, "2017-12-12T15:37:13"))
            .await
            .unwrap();

        let (got_start, got_end) = store.get_pair(70).await.unwrap();
        assert_eq!(got_start.unwrap().id, start.id);
        assert_eq!(got_end.unwrap().id, end.id);

        let bill_id = Uuid::new_v4();
        store.link_to_bill(start.id, end.id, bill_id).await.unwrap();

        let (got_start, got_end) = store.get_pair(70).await.unwrap();
        assert_eq!(got_start.unwrap().phone_bill_id, Some(bill_id));
        assert_eq!(got_end.unwrap().phone_bill_id, Some(bill_id));
    }

    #[tokio::test]
    async fn test_bill_save_get_and_update() {
        let store = InMemoryPhoneBillStore::new();
        let number = PhoneNumber::normalize("99988526423").unwrap();
        let period = ReferencePeriod::parse("12/2017").unwrap();
        let mut bill = PhoneBill::new(number, period);

        store.save(&bill).await.unwrap();
        assert!(store.exists_for(&period, "99988526423").await.unwrap());

        let err = store.save(&bill).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        bill.total_amount = Decimal::new(306, 2);
        store.update(&bill).await.unwrap();

        let stored = store.get("99988526423", &period).await.unwrap().unwrap();
        assert_eq!(stored.total_amount, Decimal::new(306, 2));
        assert_eq!(store.len(), 1);

        let by_id = store.get_by_id(bill.id).await.unwrap().unwrap();
        assert_eq!(by_id.total_amount, Decimal::new(306, 2));
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bill_get_unknown_subscriber() {
        let store = InMemoryPhoneBillStore::new();
        let period = ReferencePeriod::parse("12/2017").unwrap();

        let result = store.get("99988526423", &period).await.unwrap();
        assert!(result.is_none());
        assert!(!store.exists_for(&period, "99988526423").await.unwrap());
    }

    #[tokio::test]
    async fn test_user_save_and_duplicate() {
        let store = InMemoryUserStore::new();
        let user = User::new("mariazinha".to_string(), "$argon2id$stub".to_string());

        store.save(&user).await.unwrap();

        let found = store.find_by_username("mariazinha").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);

        let again = User::new("mariazinha".to_string(), "$argon2id$other".to_string());
        let err = store.save(&again).await.unwrap_err();
        assert!(matches!(err, AppError::UserAlreadyExists(name) if name == "mariazinha"));

        assert!(store.find_by_username("joaozinho").await.unwrap().is_none());
    }
}
