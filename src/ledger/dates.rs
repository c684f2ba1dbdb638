//! Calendar helpers: strict ISO parsing, month arithmetic, and projection windows.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a fixed-width, zero-padded `YYYY-MM-DD` date.
///
/// `chrono` alone accepts `2025-1-6`; the ledger sorts dates by their ISO text in
/// storage, so only the exact ten character form is allowed across the
/// boundary. Surrounding whitespace is rejected, not stripped.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
    if !well_formed {
        return Err(LedgerError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT)
        .map_err(|_| LedgerError::InvalidDate(raw.to_string()))
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Shifts `date` forward by whole calendar months, clamping the day to the
/// target month's length (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Number of month boundaries between `anchor` and `reference`; negative when
/// `reference` precedes `anchor`.
pub fn months_between(anchor: NaiveDate, reference: NaiveDate) -> i64 {
    let anchor_idx = i64::from(anchor.year()) * 12 + i64::from(anchor.month0());
    let reference_idx = i64::from(reference.year()) * 12 + i64::from(reference.month0());
    reference_idx - anchor_idx
}

/// Smallest number of whole `period_days` steps from `anchor` that lands on or
/// after `target`. Zero when `target` is not after `anchor`.
pub fn periods_to_reach(anchor: NaiveDate, target: NaiveDate, period_days: i64) -> i64 {
    let diff = (target - anchor).num_days();
    if diff <= 0 {
        return 0;
    }
    (diff + period_days - 1).div_euclid(period_days)
}

/// Resolves a weekday picker to the next matching calendar date, counting
/// `from` itself when it already falls on `weekday`.
pub fn next_weekday_on_or_after(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = i64::from(from.weekday().num_days_from_sunday());
    let target = i64::from(weekday.num_days_from_sunday());
    from + Duration::days((target - current).rem_euclid(7))
}

pub fn parse_weekday(raw: &str) -> Result<Weekday> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| LedgerError::InvalidDate(raw.to_string()))
}

/// Inclusive date range used for expansion and projection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LedgerError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Narrows the window so it starts no earlier than `floor`. Returns `None`
    /// when nothing of the window remains.
    pub fn clamp_start(&self, floor: NaiveDate) -> Option<Self> {
        let start = self.start.max(floor);
        (start <= self.end).then_some(Self {
            start,
            end: self.end,
        })
    }
}
