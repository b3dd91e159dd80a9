//! Call record DTOs
//!
//! Request and response shapes for the call registration endpoint. One
//! endpoint takes both legs of a call; the `type` field says which leg
//! a payload carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tarifador_core::models::{CallRecord, CallType, PhoneNumber};
use uuid::Uuid;
use validator::Validate;

/// Request body for registering one leg of a call
///
/// `source` and `destination` are required on start legs and rejected on
/// end legs; the domain model enforces that, so the DTO only carries them.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CallRecordRequest {
    /// Leg type, `"start"` or `"end"`
    #[serde(rename = "type")]
    pub call_type: CallType,

    /// Instant the leg occurred
    pub timestamp: DateTime<Utc>,

    /// Correlation id shared by both legs of one call
    #[validate(range(min = 1, message = "call_id must be a positive integer"))]
    pub call_id: i64,

    /// Subscriber number that originated the call
    pub source: Option<String>,

    /// Number that was called
    pub destination: Option<String>,
}

/// A stored call leg, as returned after registration
#[derive(Debug, Clone, Serialize)]
pub struct CallRecordResponse {
    /// Record id assigned by the server
    pub id: Uuid,

    /// Leg type, `"start"` or `"end"`
    #[serde(rename = "type")]
    pub call_type: CallType,

    /// Instant the leg occurred
    pub timestamp: DateTime<Utc>,

    /// Correlation id shared by both legs of one call
    pub call_id: i64,

    /// Normalized source number, present on start legs
    pub source: Option<String>,

    /// Normalized destination number, present on start legs
    pub destination: Option<String>,
}

impl From<CallRecord> for CallRecordResponse {
    fn from(record: CallRecord) -> Self {
        Self {
            id: record.id,
            call_type: record.call_type,
            timestamp: record.timestamp,
            call_id: record.call_id,
            source: record.source.map(PhoneNumber::into_string),
            destination: record.destination.map(PhoneNumber::into_string),
        }
    }
}
