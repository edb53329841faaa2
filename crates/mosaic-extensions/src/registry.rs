//! Extension registry management
//!
//! The registry is the single owner of per-extension state: metadata, the
//! live instance, and the boolean load flag. Instances are created by the
//! caller (the VM-side loader) and handed in via `add_instance`; the registry
//! never constructs them and never runs lifecycle hooks itself.

use mosaic_core::types::ExtensionInfo;
use mosaic_core::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

use crate::extension::Extension;

/// State kept per registered extension
#[derive(Debug)]
pub struct RegistryEntry {
    /// Immutable metadata
    pub info: ExtensionInfo,

    /// Live instance supplied by the caller
    pub instance: Box<dyn Extension>,

    /// Whether the extension is currently loaded (initialized)
    pub loaded: bool,
}

/// Registry of extension entries keyed by id.
///
/// Alongside the map, the registry tracks the order in which load flags were
/// set, so event broadcasts iterate extensions deterministically in load
/// order.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: HashMap<String, RegistryEntry>,
    load_order: Vec<String>,
}

impl ExtensionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new extension entry with its load flag cleared.
    ///
    /// Fails with `DuplicateExtension` if the id is already registered.
    pub fn add_instance(
        &mut self,
        id: impl Into<String>,
        info: ExtensionInfo,
        instance: Box<dyn Extension>,
    ) -> Result<()> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(Error::duplicate_extension(id));
        }

        debug!(extension = %id, version = %info.version, "extension registered");
        self.entries.insert(
            id,
            RegistryEntry {
                info,
                instance,
                loaded: false,
            },
        );
        Ok(())
    }

    /// Delete an entry, returning it.
    ///
    /// Does not run `on_uninit`; tearing the instance down first is the
    /// unload path's responsibility.
    pub fn remove_instance(&mut self, id: &str) -> Result<RegistryEntry> {
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| Error::not_found(id))?;
        self.load_order.retain(|loaded| loaded != id);

        debug!(extension = %id, "extension removed from registry");
        Ok(entry)
    }

    /// Get extension metadata
    pub fn info(&self, id: &str) -> Result<&ExtensionInfo> {
        self.entries
            .get(id)
            .map(|e| &e.info)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Get a mutable handle to the live instance
    pub fn instance_mut(&mut self, id: &str) -> Result<&mut Box<dyn Extension>> {
        self.entries
            .get_mut(id)
            .map(|e| &mut e.instance)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Check whether an id is registered. Never fails.
    pub fn exist(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Set the load flag, maintaining the load-order list
    pub fn set_load_status(&mut self, id: &str, status: bool) -> Result<()> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| Error::not_found(id))?;
        entry.loaded = status;

        if status {
            if !self.load_order.iter().any(|loaded| loaded == id) {
                self.load_order.push(id.to_string());
            }
        } else {
            self.load_order.retain(|loaded| loaded != id);
        }
        Ok(())
    }

    /// Read the load flag
    pub fn load_status(&self, id: &str) -> Result<bool> {
        self.entries
            .get(id)
            .map(|e| e.loaded)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Ids with the load flag set, sorted for stable output.
    ///
    /// The ordering is not part of the contract; callers needing the order
    /// extensions were loaded in should use [`load_order`](Self::load_order).
    pub fn loaded_extensions(&self) -> Vec<String> {
        let mut loaded: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.loaded)
            .map(|(id, _)| id.clone())
            .collect();
        loaded.sort();
        loaded
    }

    /// Ids in the order their load flag was last set
    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    /// Iterate over all registered entries
    pub fn entries(&self) -> impl Iterator<Item = (&String, &RegistryEntry)> {
        self.entries.iter()
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
