//! Canonical shapes produced by `normalize`

use crate::error::Result;
use crate::history::MonthKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub type JsonMap = serde_json::Map<String, Value>;

/// Key holding the month shown by the portal UI
pub const DISPLAYED_MONTH_KEY: &str = "luna_afisata";

/// Account and billing summary (`home`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountInfo(JsonMap);

impl AccountInfo {
    pub fn from_map(map: JsonMap) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field rendered as text; empty strings and nulls count as missing
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_text)
    }

    /// Month the portal currently displays. `Ok(None)` when the field is
    /// missing or blank; a present but malformed value is an error.
    pub fn displayed_month(&self) -> Result<Option<MonthKey>> {
        self.text(DISPLAYED_MONTH_KEY)
            .map(|s| MonthKey::parse(&s))
            .transpose()
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }
}

/// One payment or receipt record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    /// Month label (`luna`), empty when the portal omitted it
    pub month: String,
    /// Amount (`suma`) in bani
    pub amount_cents: Option<i64>,
    /// Every field as sent by the portal
    pub fields: JsonMap,
}

impl PaymentRow {
    pub fn from_fields(fields: JsonMap) -> Self {
        let month = fields.get("luna").and_then(value_text).unwrap_or_default();
        let amount_cents = fields.get("suma").and_then(parse_amount_cents);
        Self {
            month,
            amount_cents,
            fields,
        }
    }

    pub fn amount_lei(&self) -> Option<f64> {
        self.amount_cents.map(|c| c as f64 / 100.0)
    }
}

/// One physical meter's reading for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterRow {
    /// Parsed `index_nou`; `None` when missing or not an integer
    pub new_index: Option<i64>,
    /// Parsed `data`
    pub reading_date: Option<NaiveDate>,
    pub fields: JsonMap,
}

impl MeterRow {
    pub fn from_fields(fields: JsonMap) -> Self {
        let new_index = fields.get("index_nou").and_then(parse_index_value);
        let reading_date = fields.get("data").and_then(parse_reading_date);
        Self {
            new_index,
            reading_date,
            fields,
        }
    }
}

/// Months with meter data, as reported by the portal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingMonths(JsonMap);

impl ReadingMonths {
    pub fn from_map(map: JsonMap) -> Self {
        Self(map)
    }

    pub fn raw(&self) -> &JsonMap {
        &self.0
    }

    /// Every month key mentioned either as a key, a plain value or a `luna` field
    pub fn months(&self) -> BTreeSet<MonthKey> {
        let mut out = BTreeSet::new();
        for (key, value) in &self.0 {
            if let Ok(m) = MonthKey::parse(key) {
                out.insert(m);
            }
            let candidate = match value {
                Value::Object(obj) => obj.get("luna").and_then(value_text),
                other => value_text(other),
            };
            if let Some(m) = candidate.and_then(|s| MonthKey::parse(&s).ok()) {
                out.insert(m);
            }
        }
        out
    }
}

/// Scalar JSON value as trimmed text
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Meter index as an integer. Integral floats are accepted, fractions and
/// blanks are not.
pub fn parse_index_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// `YYYY-MM-DD`, optionally followed by a time part
pub fn parse_reading_date(value: &Value) -> Option<NaiveDate> {
    let text = value_text(value)?;
    let day = text.get(..10).unwrap_or(&text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_amount_cents(value: &Value) -> Option<i64> {
    let text = value_text(value)?.replace(',', ".");
    let f = text.parse::<f64>().ok()?;
    f.is_finite().then(|| f.round() as i64)
}
