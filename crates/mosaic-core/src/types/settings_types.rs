//! Settings schema types
//!
//! An extension declares its settings as a list of typed items; the host
//! persists values keyed by extension id and validates writes against the
//! declared item.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declared settings entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettingsItem {
    /// On/off toggle
    Boolean { id: String, default: bool },

    /// Numeric input with optional bounds and precision
    Number {
        id: String,
        default: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        /// Number of decimal places the UI offers; 0 means integer
        #[serde(default)]
        precision: Option<u8>,
    },

    /// Choice among a fixed set of string values
    Selector {
        id: String,
        default: String,
        items: Vec<String>,
    },
}

impl SettingsItem {
    /// The item's key within its extension's settings blob
    pub fn id(&self) -> &str {
        match self {
            SettingsItem::Boolean { id, .. }
            | SettingsItem::Number { id, .. }
            | SettingsItem::Selector { id, .. } => id,
        }
    }

    /// The declared default as a JSON value
    pub fn default_value(&self) -> Value {
        match self {
            SettingsItem::Boolean { default, .. } => Value::Bool(*default),
            SettingsItem::Number { default, .. } => {
                serde_json::Number::from_f64(*default).map_or(Value::Null, Value::Number)
            }
            SettingsItem::Selector { default, .. } => Value::String(default.clone()),
        }
    }

    /// Validate a candidate value against this item's type and constraints
    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            SettingsItem::Boolean { id, .. } => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(Error::settings(id, "expected a boolean"))
                }
            }
            SettingsItem::Number { id, min, max, .. } => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| Error::settings(id, "expected a number"))?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(Error::settings(id, format!("{n} is below minimum {min}")));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(Error::settings(id, format!("{n} is above maximum {max}")));
                    }
                }
                Ok(())
            }
            SettingsItem::Selector { id, items, .. } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Error::settings(id, "expected a string"))?;
                if items.iter().any(|item| item == s) {
                    Ok(())
                } else {
                    Err(Error::settings(id, format!("'{s}' is not one of the declared items")))
                }
            }
        }
    }
}
