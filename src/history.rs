//! Month keys and meter-index reconciliation
//!
//! A month can carry several meter rows (one per physical meter) and each row
//! may or may not hold a usable `index_nou`. Reconciliation picks the largest
//! parseable value of the month: indexes are cumulative, so the largest one
//! is also the newest. Months without any usable row stay `None`, which is
//! kept apart from an explicit `Some(0)` reading.

use crate::error::{EblocError, Result};
use crate::portal::MeterRow;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Calendar month, ordered chronologically and rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((1..=12).contains(&month) && (0..=9999).contains(&year)).then_some(Self { year, month })
    }

    /// Parse `YYYY-MM` (or `YYYY-M`), tolerating a trailing day or timestamp
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || {
            EblocError::validation("month".to_string(), format!("Invalid month key '{}'", text))
        };
        let text = text.trim();
        let mut parts = text.splitn(3, '-');
        let (Some(y), Some(m)) = (parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if y.len() != 4 || !(1..=2).contains(&m.len()) || !digits(y) || !digits(m) {
            return Err(invalid());
        }
        let year = y.parse::<i32>().map_err(|_| invalid())?;
        let month = m.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current_utc() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Month before this one; `None` before `0000-01`
    pub fn previous(&self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = EblocError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// `count` months ending at `end`, newest first. At least one month is
/// returned; the window stops early at `0000-01`.
pub fn trailing_months(end: MonthKey, count: usize) -> Vec<MonthKey> {
    std::iter::successors(Some(end), MonthKey::previous)
        .take(count.max(1))
        .collect()
}

/// Reconciled value of one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthReading {
    pub value: i64,
    /// Date of the row the value came from, when the portal sent one
    pub reading_date: Option<NaiveDate>,
}

/// Largest parseable index among `rows`; ties prefer the latest reading date
pub fn reconcile_month(rows: &[MeterRow]) -> Option<MonthReading> {
    rows.iter()
        .filter_map(|row| row.new_index.map(|v| (v, row.reading_date)))
        .max()
        .map(|(value, reading_date)| MonthReading {
            value,
            reading_date,
        })
}

/// Reconciled value per month; `None` when no row was usable
pub type IndexHistory = BTreeMap<MonthKey, Option<i64>>;

/// Most recent nonzero reading in a history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestIndex {
    pub month: MonthKey,
    pub value: i64,
    pub reading_date: Option<NaiveDate>,
}

/// Reconcile every month and select the latest nonzero reading
pub fn reconcile_history(
    months: &BTreeMap<MonthKey, Vec<MeterRow>>,
) -> (IndexHistory, Option<LatestIndex>) {
    let readings: BTreeMap<MonthKey, Option<MonthReading>> = months
        .iter()
        .map(|(month, rows)| (*month, reconcile_month(rows)))
        .collect();

    let latest = readings
        .iter()
        .rev()
        .find_map(|(month, reading)| match reading {
            Some(r) if r.value != 0 => Some(LatestIndex {
                month: *month,
                value: r.value,
                reading_date: r.reading_date,
            }),
            _ => None,
        });

    let history = readings
        .into_iter()
        .map(|(month, reading)| (month, reading.map(|r| r.value)))
        .collect();
    (history, latest)
}
