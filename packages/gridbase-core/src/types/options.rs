//! Per-type column option bags.

use serde::{Deserialize, Serialize};

use super::ColumnType;
use crate::value::Value;

/// Constraint metadata attached to a column.
///
/// Options are advisory: they are generated and stored with the column but
/// no write path enforces them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnOptions {
    pub required: bool,
    pub unique: bool,
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColumnOptions {
    /// Default options generated for a column of the given type.
    pub fn defaults_for(column_type: ColumnType) -> Self {
        let common = Self::default();
        match column_type {
            ColumnType::Number => Self {
                decimal: Some(false),
                ..common
            },
            ColumnType::Date => Self {
                format: Some("YYYY-MM-DD".to_string()),
                ..common
            },
            _ => common,
        }
    }
}
