//! Call record model
//!
//! Represents one leg of a phone call. A call produces two legs, a start
//! and an end, correlated by `call_id`; legs arrive independently and in
//! arbitrary order.

use crate::error::AppError;
use crate::models::phone::PhoneNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which leg of a call a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    /// The moment the call was established
    Start,
    /// The moment the call was hung up
    End,
}

impl CallType {
    /// Canonical wire/database form
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Start => "start",
            CallType::End => "end",
        }
    }

    /// Parse from the canonical form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(CallType::Start),
            "end" => Some(CallType::End),
            _ => None,
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One leg (start or end) of a phone call
///
/// A start leg carries the two phone numbers involved; an end leg carries
/// none. Both constraints are enforced at construction, so every
/// `CallRecord` in the system is structurally valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Correlates the two legs of one call
    pub call_id: i64,

    /// Which leg this record is
    pub call_type: CallType,

    /// When the leg occurred
    pub timestamp: DateTime<Utc>,

    /// Subscriber that originated the call (start legs only)
    pub source: Option<PhoneNumber>,

    /// Number that was called (start legs only)
    pub destination: Option<PhoneNumber>,

    /// Bill this leg was billed on, once its pair completed
    pub phone_bill_id: Option<Uuid>,
}

impl CallRecord {
    /// Build a validated call record from raw input
    ///
    /// Start legs require both numbers; they are normalized and must not be
    /// equal to each other. End legs have source and destination cleared
    /// silently, whatever was submitted.
    pub fn new(
        call_id: i64,
        call_type: CallType,
        timestamp: DateTime<Utc>,
        source: Option<String>,
        destination: Option<String>,
    ) -> Result<Self, AppError> {
        let (source, destination) = match call_type {
            CallType::Start => {
                let source = source.filter(|s| !s.is_empty()).ok_or_else(|| {
                    AppError::Validation(
                        "Source and destination are required for a start call record.".to_string(),
                    )
                })?;
                let destination = destination.filter(|s| !s.is_empty()).ok_or_else(|| {
                    AppError::Validation(
                        "Source and destination are required for a start call record.".to_string(),
                    )
                })?;

                let source = PhoneNumber::normalize(&source)?;
                let destination = PhoneNumber::normalize(&destination)?;

                if source == destination {
                    return Err(AppError::InvalidPhoneNumber(source.into_string()));
                }

                (Some(source), Some(destination))
            }
            CallType::End => (None, None),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            call_id,
            call_type,
            timestamp,
            source,
            destination,
            phone_bill_id: None,
        })
    }

    /// Check if this is the start leg
    #[inline]
    pub fn is_start(&self) -> bool {
        self.call_type == CallType::Start
    }

    /// Check if this is the end leg
    #[inline]
    pub fn is_end(&self) -> bool {
        self.call_type == CallType::End
    }
}

/// A matched (start, end) leg combination for one call
///
/// Created by the reconciler exactly once, when both legs exist.
#[derive(Debug, Clone)]
pub struct CallPair {
    pub start: CallRecord,
    pub end: CallRecord,
}

impl CallPair {
    pub fn new(start: CallRecord, end: CallRecord) -> Self {
        Self { start, end }
    }

    /// The call both legs belong to
    pub fn call_id(&self) -> i64 {
        self.start.call_id
    }
}
