//! Column types and their validate/format capabilities.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::TypeError;
use crate::value::Value;

/// Naive timestamp layouts accepted for dates, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Canonical date rendering (millisecond ISO-8601 in UTC).
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Closed set of column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
    Email,
    Url,
    Textarea,
    BackgroundColor,
}

impl ColumnType {
    /// Every column type, in menu order.
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Text,
        ColumnType::Number,
        ColumnType::Date,
        ColumnType::Email,
        ColumnType::Url,
        ColumnType::Textarea,
        ColumnType::BackgroundColor,
    ];

    /// Serialized type identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Email => "email",
            ColumnType::Url => "url",
            ColumnType::Textarea => "textarea",
            ColumnType::BackgroundColor => "backgroundColor",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Text => "Text",
            ColumnType::Number => "Number",
            ColumnType::Date => "Date",
            ColumnType::Email => "Email",
            ColumnType::Url => "URL",
            ColumnType::Textarea => "Long Text",
            ColumnType::BackgroundColor => "Background Color",
        }
    }

    /// Checks whether a value is acceptable for this type.
    pub fn validate(self, value: &Value) -> bool {
        match self {
            ColumnType::Text | ColumnType::Textarea | ColumnType::BackgroundColor => {
                matches!(value, Value::Text(_))
            }
            ColumnType::Number => parse_number(value).is_ok(),
            ColumnType::Date => parse_date(value).is_ok(),
            ColumnType::Email => value
                .as_text()
                .is_some_and(|text| email_pattern().is_match(text)),
            ColumnType::Url => value
                .as_text()
                .is_some_and(|text| url::Url::parse(text).is_ok()),
        }
    }

    /// Converts a value into this type's canonical form.
    ///
    /// # Arguments
    /// * `value` - Value to format
    ///
    /// # Returns
    /// `Result<Value, TypeError>` with the canonical value.
    pub fn format(self, value: &Value) -> Result<Value, TypeError> {
        match self {
            ColumnType::Text | ColumnType::Textarea | ColumnType::BackgroundColor => {
                Ok(Value::Text(value.to_text()))
            }
            ColumnType::Number => parse_number(value).map(Value::Number),
            ColumnType::Date => {
                parse_date(value).map(|date| Value::Text(date.format(ISO_FORMAT).to_string()))
            }
            ColumnType::Email => match value {
                Value::Text(text) => Ok(Value::Text(text.to_lowercase())),
                other => Err(TypeError::UnsupportedValue {
                    type_id: "email",
                    kind: kind_of(other),
                }),
            },
            ColumnType::Url => Ok(value.clone()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| TypeError::UnknownType(s.to_string()))
    }
}

/// Converts a value from one column type to another.
///
/// The value is first formatted by `from`, then by `to`. Blank input and
/// any formatting failure yield the empty string, so this never fails.
pub fn convert(value: &Value, from: ColumnType, to: ColumnType) -> Value {
    if value.is_empty() {
        return Value::empty();
    }

    match from.format(value).and_then(|standard| to.format(&standard)) {
        Ok(converted) => converted,
        Err(e) => {
            tracing::debug!("Conversion {} -> {} failed: {}", from, to, e);
            Value::empty()
        }
    }
}

/// Parses a numeric value the way a spreadsheet cell would.
pub(crate) fn parse_number(value: &Value) -> Result<f64, TypeError> {
    let invalid = || TypeError::InvalidValue {
        type_id: "number",
        value: value.to_text(),
    };

    match value {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) if n.is_finite() => Ok(*n),
        Value::Number(_) => Err(invalid()),
        Value::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(invalid()),
            }
        }
    }
}

/// Parses a date value into a UTC timestamp.
///
/// Numbers are epoch milliseconds; text accepts RFC 3339, RFC 2822,
/// plain dates and naive timestamps (taken as UTC).
pub(crate) fn parse_date(value: &Value) -> Result<DateTime<Utc>, TypeError> {
    let invalid = || TypeError::InvalidValue {
        type_id: "date",
        value: value.to_text(),
    };

    match value {
        Value::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).ok_or_else(invalid)
        }
        Value::Text(text) => {
            let text = text.trim();
            if let Ok(date) = DateTime::parse_from_rfc3339(text) {
                return Ok(date.with_timezone(&Utc));
            }
            if let Ok(date) = DateTime::parse_from_rfc2822(text) {
                return Ok(date.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                    return Ok(midnight.and_utc());
                }
            }
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(invalid)
        }
        other => Err(TypeError::UnsupportedValue {
            type_id: "date",
            kind: kind_of(other),
        }),
    }
}

pub(crate) fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::Text(_) => "text",
    }
}
