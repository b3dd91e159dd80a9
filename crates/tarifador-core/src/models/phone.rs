//! Subscriber phone number value type
//!
//! Numbers arrive with human formatting (spaces, hyphens, parentheses, the
//! `+55` country code) and are stored in canonical digit-only form: a two
//! digit area code followed by an 8 or 9 digit subscriber number.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized, validated phone number (10 or 11 digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

/// Strip formatting noise from a raw number without validating it.
///
/// Removes spaces, hyphens, parentheses, then every occurrence of the
/// `+55` country-code literal. Bill lookups use this directly so a
/// malformed filter falls through to an empty result instead of an error.
pub fn strip_formatting(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect::<String>()
        .replace("+55", "")
}

impl PhoneNumber {
    /// Normalize and validate a raw phone number
    pub fn normalize(raw: &str) -> Result<Self, AppError> {
        let cleaned = strip_formatting(raw);

        if Self::is_valid(&cleaned) {
            Ok(Self(cleaned))
        } else {
            Err(AppError::InvalidPhoneNumber(raw.to_string()))
        }
    }

    /// Two digits of area code plus an 8 or 9 digit subscriber number
    fn is_valid(digits: &str) -> bool {
        (digits.len() == 10 || digits.len() == 11)
            && digits.chars().all(|c| c.is_ascii_digit())
    }

    /// The canonical digit string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the canonical digit string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PhoneNumber> for String {
    fn from(number: PhoneNumber) -> Self {
        number.0
    }
}
