//! Tariff engine
//!
//! Prices a completed call: a fixed standing charge plus a per-minute
//! charge for every whole minute spent inside the daily peak window.
//! The walk over the call interval clamps the window independently per
//! calendar day, so a call spanning midnight (or several days) never
//! double-counts minutes.

use crate::config::TariffConfig;
use crate::error::AppError;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;

/// Rates and peak-window bounds applied to every call
#[derive(Debug, Clone)]
pub struct Tariff {
    /// Fixed charge applied to every completed call
    pub standing_charge: Decimal,

    /// Charge per whole minute inside the peak window
    pub call_charge_per_minute: Decimal,

    /// Peak window lower bound
    pub peak_window_start: NaiveTime,

    /// Peak window upper bound (inclusive)
    pub peak_window_end: NaiveTime,
}

impl Tariff {
    /// Build a tariff from configuration, parsing the window bounds
    pub fn from_config(config: &TariffConfig) -> Result<Self, AppError> {
        let peak_window_start = parse_window_bound(&config.peak_window_start)?;
        let peak_window_end = parse_window_bound(&config.peak_window_end)?;

        Ok(Self {
            standing_charge: config.standing_charge,
            call_charge_per_minute: config.call_charge_per_minute,
            peak_window_start,
            peak_window_end,
        })
    }

    /// Count the whole minutes of [start, end] that fall inside the peak
    /// window, across however many calendar days the call spans
    ///
    /// The first day is bounded below by the actual start time, the last
    /// day above by the actual end time; full days in between contribute
    /// the whole window. Partial minutes are floored. A non-positive
    /// interval counts zero minutes.
    pub fn peak_minutes(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
        let start_date = start.date_naive();
        let end_date = end.date_naive();

        let mut total = 0;
        let mut day = start_date;

        while day <= end_date {
            let lower = if day == start_date {
                start.time()
            } else {
                self.peak_window_start
            };
            let upper = if day == end_date {
                end.time()
            } else {
                self.peak_window_end
            };

            total += self.daily_peak_minutes(lower, upper);

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        total
    }

    /// Whole peak minutes contributed by a single day
    fn daily_peak_minutes(&self, start: NaiveTime, end: NaiveTime) -> i64 {
        let lower = start.max(self.peak_window_start);
        let upper = end.min(self.peak_window_end);

        if lower >= upper {
            return 0;
        }

        (upper - lower).num_seconds() / 60
    }

    /// Total cost of a call: standing charge plus peak-minute charges
    pub fn cost(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Decimal {
        let minutes = self.peak_minutes(start, end);
        self.standing_charge + self.call_charge_per_minute * Decimal::from(minutes)
    }

    /// Elapsed wall-clock time rendered as `"HhMmSs"`
    ///
    /// Each unit is truncated, hours are not capped at 24, and a
    /// non-positive interval renders as `"0h0m0s"`.
    pub fn duration(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
        let total_seconds = (*end - *start).num_seconds().max(0);

        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        format!("{}h{}m{}s", hours, minutes, seconds)
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self::from_config(&TariffConfig::default()).expect("default tariff config is valid")
    }
}

fn parse_window_bound(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .map_err(|_| AppError::Config(format!("invalid peak window bound '{}'", s)))
}
