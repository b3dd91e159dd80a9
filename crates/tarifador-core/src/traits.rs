//! Repository traits
//!
//! The persistence seams the rating engine depends on. Implemented by the
//! Postgres repositories in `tarifador-db` and by in-memory doubles for
//! tests; services only ever see these traits.

use crate::error::AppError;
use crate::models::{CallRecord, CallType, PhoneBill, ReferencePeriod, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Storage for individual call legs
///
/// Phone-number parameters and keys are canonical digit strings; the
/// reconciler normalizes before it touches the store.
#[async_trait]
pub trait CallRecordStore: Send + Sync {
    /// Persist a new leg
    async fn save(&self, record: &CallRecord) -> Result<CallRecord, AppError>;

    /// Whether a leg with this (call_id, call_type) is already stored
    async fn exists(&self, call_id: i64, call_type: CallType) -> Result<bool, AppError>;

    /// Whether the start leg for this call is already stored
    async fn start_exists(&self, call_id: i64) -> Result<bool, AppError>;

    /// Overwrite timestamp, source and destination on the stored leg
    /// matching `record`'s (call_id, call_type); returns the stored row
    async fn update(&self, record: &CallRecord) -> Result<CallRecord, AppError>;

    /// Both legs for a call, in (start, end) order, either possibly absent
    async fn get_pair(
        &self,
        call_id: i64,
    ) -> Result<(Option<CallRecord>, Option<CallRecord>), AppError>;

    /// Mark both legs as billed on the given bill
    async fn link_to_bill(
        &self,
        start_id: Uuid,
        end_id: Uuid,
        bill_id: Uuid,
    ) -> Result<(), AppError>;
}

/// Storage for phone bills, keyed by (subscriber, reference period)
#[async_trait]
pub trait PhoneBillStore: Send + Sync {
    /// The bill for an exact (subscriber, period) key, if one exists
    async fn get(
        &self,
        phone_number: &str,
        period: &ReferencePeriod,
    ) -> Result<Option<PhoneBill>, AppError>;

    /// The bill a completed call was linked to, if it still exists
    async fn get_by_id(&self, id: Uuid) -> Result<Option<PhoneBill>, AppError>;

    /// Whether a bill exists for the key
    async fn exists_for(
        &self,
        period: &ReferencePeriod,
        phone_number: &str,
    ) -> Result<bool, AppError>;

    /// Persist a new bill
    async fn save(&self, bill: &PhoneBill) -> Result<PhoneBill, AppError>;

    /// Rewrite an existing bill's lines and total
    async fn update(&self, bill: &PhoneBill) -> Result<PhoneBill, AppError>;
}

/// Storage for API users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user; a duplicate username is a conflict
    async fn save(&self, user: &User) -> Result<User, AppError>;

    /// Look a user up by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}
