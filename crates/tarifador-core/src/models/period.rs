//! Billing reference period
//!
//! The calendar month a phone bill covers. Accepted on input as `M/YYYY`
//! or `MM/YYYY`; the canonical form is always zero-padded (`03/2024`) so
//! (subscriber, period) lookups are stable regardless of how the caller
//! wrote the month.

use crate::error::AppError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated (month, year) billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferencePeriod {
    month: u32,
    year: i32,
}

impl ReferencePeriod {
    /// Build a period, checking the month and year ranges
    pub fn new(month: u32, year: i32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(AppError::InvalidReferencePeriod);
        }
        Ok(Self { month, year })
    }

    /// Parse `M/YYYY` or `MM/YYYY`
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let (month_part, year_part) = s.split_once('/').ok_or(AppError::InvalidReferencePeriod)?;

        if month_part.is_empty() || month_part.len() > 2 || year_part.len() != 4 {
            return Err(AppError::InvalidReferencePeriod);
        }

        let month: u32 = month_part
            .parse()
            .map_err(|_| AppError::InvalidReferencePeriod)?;
        let year: i32 = year_part
            .parse()
            .map_err(|_| AppError::InvalidReferencePeriod)?;

        Self::new(month, year)
    }

    /// The period a timestamp falls in
    pub fn from_timestamp(timestamp: &DateTime<Utc>) -> Self {
        Self {
            month: timestamp.month(),
            year: timestamp.year(),
        }
    }

    /// The month before the given date, wrapping December into the
    /// previous year
    ///
    /// This is the default period for bill queries that omit one.
    pub fn previous_month(today: NaiveDate) -> Self {
        if today.month() == 1 {
            Self {
                month: 12,
                year: today.year() - 1,
            }
        } else {
            Self {
                month: today.month() - 1,
                year: today.year(),
            }
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

impl Serialize for ReferencePeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReferencePeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PeriodVisitor;

        impl Visitor<'_> for PeriodVisitor {
            type Value = ReferencePeriod;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a reference period in M/YYYY or MM/YYYY form")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                ReferencePeriod::parse(value).map_err(|e| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(PeriodVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_padded_and_unpadded() {
        assert_eq!(
            ReferencePeriod::parse("11/2023").unwrap().to_string(),
            "11/2023"
        );
        assert_eq!(
            ReferencePeriod::parse("3/2024").unwrap().to_string(),
            "03/2024"
        );
        assert_eq!(
            ReferencePeriod::parse("02/2016").unwrap().to_string(),
            "02/2016"
        );
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["", "11", "11-2023", "2023/11", "0/2023", "13/2023", "11/23", "1a/2023"] {
            let err = ReferencePeriod::parse(input).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidReferencePeriod),
                "expected rejection for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_from_timestamp() {
        let ts = "2017-12-12T21:57:13Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(ReferencePeriod::from_timestamp(&ts).to_string(), "12/2017");
    }

    #[test]
    fn test_previous_month() {
        let today = NaiveDate::from_ymd_opt(2023, 12, 15).unwrap();
        assert_eq!(
            ReferencePeriod::previous_month(today).to_string(),
            "11/2023"
        );
    }

    #[test]
    fn test_previous_month_wraps_december() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(
            ReferencePeriod::previous_month(today).to_string(),
            "12/2023"
        );
    }
}
