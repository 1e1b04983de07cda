//! Raw portal JSON to canonical shapes
//!
//! The portal answers with whatever PHP's `json_encode` produced: an object
//! keyed by row number, an object wrapped under `"1"`, or `[]` when there is
//! nothing to report. Each function accepts the shapes seen in practice and
//! rejects anything else with an auth/response error.

use super::types::{AccountInfo, JsonMap, MeterRow, PaymentRow, ReadingMonths};
use crate::error::{EblocError, Result};
use serde_json::Value;

/// Characters of a raw body kept in diagnostic logs
pub const BODY_LOG_LIMIT: usize = 200;

const ACCOUNT_WRAPPER_KEY: &str = "1";

/// Account info, unwrapping the `{"1": {...}}` envelope when present
pub fn account_info(value: Value) -> Result<AccountInfo> {
    match value {
        Value::Object(mut map) => {
            if matches!(map.get(ACCOUNT_WRAPPER_KEY), Some(Value::Object(_)))
                && let Some(Value::Object(inner)) = map.remove(ACCOUNT_WRAPPER_KEY)
            {
                return Ok(AccountInfo::from_map(inner));
            }
            Ok(AccountInfo::from_map(map))
        }
        other => Err(unexpected_shape("account info", &other)),
    }
}

/// Payment rows newest first, truncated to `months` (0 keeps everything)
pub fn payment_rows(value: Value, months: usize) -> Result<Vec<PaymentRow>> {
    let mut rows: Vec<PaymentRow> = object_entries(value, "payment history")?
        .into_iter()
        .map(PaymentRow::from_fields)
        .collect();
    rows.sort_by(|a, b| b.month.cmp(&a.month));
    if months > 0 {
        rows.truncate(months);
    }
    Ok(rows)
}

/// Per-meter rows for one month
pub fn meter_rows(value: Value) -> Result<Vec<MeterRow>> {
    Ok(object_entries(value, "meter readings")?
        .into_iter()
        .map(MeterRow::from_fields)
        .collect())
}

pub fn reading_months(value: Value) -> Result<ReadingMonths> {
    match value {
        Value::Object(map) => Ok(ReadingMonths::from_map(map)),
        Value::Array(items) if items.is_empty() => Ok(ReadingMonths::default()),
        other => Err(unexpected_shape("reading months", &other)),
    }
}

/// Object-typed entries of a row collection; metadata scalars are dropped
fn object_entries(value: Value, what: &str) -> Result<Vec<JsonMap>> {
    let items: Vec<Value> = match value {
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(items) => items,
        other => return Err(unexpected_shape(what, &other)),
    };
    Ok(items
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(m) => Some(m),
            _ => None,
        })
        .collect())
}

fn unexpected_shape(what: &str, value: &Value) -> EblocError {
    EblocError::auth(format!(
        "Unexpected {} response: top-level {}",
        what,
        json_kind(value)
    ))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a 200 response is actually the portal's login form
pub fn looks_like_login_page(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("login") && lower.contains("password")
}

/// First `limit` characters of a body, for logs
pub fn truncate_body(body: &str, limit: usize) -> &str {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
