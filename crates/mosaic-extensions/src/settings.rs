//! Per-extension settings storage
//!
//! Each extension may register a settings schema (a list of typed items).
//! Values are stored as a JSON object per extension id; reads merge stored
//! values over schema defaults, writes are validated against the declared
//! item.

use mosaic_core::types::SettingsItem;
use mosaic_core::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Settings store keyed by extension id
#[derive(Default)]
pub struct SettingsStore {
    schemas: HashMap<String, Vec<SettingsItem>>,
    values: HashMap<String, Map<String, Value>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the settings schema for an extension.
    ///
    /// Stored values are retained; unknown keys simply stop validating.
    pub fn register_schema(&mut self, id: impl Into<String>, items: Vec<SettingsItem>) {
        let id = id.into();
        debug!(extension = %id, items = items.len(), "settings schema registered");
        self.schemas.insert(id, items);
    }

    /// The full settings blob for an extension: defaults from the schema
    /// overlaid with stored values. Fails with `NotFound` if the extension
    /// never registered a schema.
    pub fn settings(&self, id: &str) -> Result<Value> {
        let schema = self.schemas.get(id).ok_or_else(|| Error::not_found(id))?;

        let mut merged = Map::new();
        for item in schema {
            merged.insert(item.id().to_string(), item.default_value());
        }
        if let Some(stored) = self.values.get(id) {
            for (key, value) in stored {
                merged.insert(key.clone(), value.clone());
            }
        }
        Ok(Value::Object(merged))
    }

    /// Read a single setting, falling back to the schema default
    pub fn get_item(&self, id: &str, key: &str) -> Result<Value> {
        let schema = self.schemas.get(id).ok_or_else(|| Error::not_found(id))?;

        if let Some(value) = self.values.get(id).and_then(|v| v.get(key)) {
            return Ok(value.clone());
        }
        schema
            .iter()
            .find(|item| item.id() == key)
            .map(SettingsItem::default_value)
            .ok_or_else(|| Error::not_found(format!("{id}/{key}")))
    }

    /// Write a single setting after validating it against the schema
    pub fn set_item(&mut self, id: &str, key: &str, value: Value) -> Result<()> {
        let schema = self.schemas.get(id).ok_or_else(|| Error::not_found(id))?;
        let item = schema
            .iter()
            .find(|item| item.id() == key)
            .ok_or_else(|| Error::not_found(format!("{id}/{key}")))?;

        item.validate(&value)?;
        self.values
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Replace the stored blob for an extension without validation.
    ///
    /// Used when restoring persisted settings from the host shell; individual
    /// writes through `set_item` remain validated.
    pub fn restore(&mut self, id: impl Into<String>, blob: Map<String, Value>) {
        self.values.insert(id.into(), blob);
    }

    /// Drop schema and values for an extension
    pub fn remove(&mut self, id: &str) {
        self.schemas.remove(id);
        self.values.remove(id);
    }
}
