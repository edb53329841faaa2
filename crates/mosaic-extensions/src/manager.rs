//! Extension lifecycle orchestration
//!
//! The manager owns the registry and the host context, computes load and
//! unload plans through the dependency resolver, and drives lifecycle hooks
//! in plan order. All mutation of extension state flows through the methods
//! here; batch operations await each entry to completion before the next, so
//! later entries can rely on state established by earlier ones.

use async_trait::async_trait;
use mosaic_core::types::{ExtensionInfo, ExtensionLoadInfo, SettingsItem};
use mosaic_core::{Error, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dependency::DependencyResolver;
use crate::events::{DispatchFailure, DispatchReport, EventEnvelope, ExtensionEvent};
use crate::extension::{Extension, HookSet};
use crate::host::{GlobalFunction, HostContext};
use crate::registry::ExtensionRegistry;

/// VM-side activation collaborator.
///
/// Invoked once per plan entry right before `on_init`, giving the host shell
/// the chance to wire the already-obtained module into the VM (fetching the
/// module from storage or network is out of scope here; entries must be
/// registered through `add_instance` before loading).
#[async_trait]
pub trait ExtensionLoader: Send {
    async fn load(&mut self, entry: &ExtensionLoadInfo) -> anyhow::Result<()>;
}

/// Loader for hosts with no VM-side activation step
pub struct NullLoader;

#[async_trait]
impl ExtensionLoader for NullLoader {
    async fn load(&mut self, _entry: &ExtensionLoadInfo) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Central extension manager.
///
/// Constructed once at host start and threaded through every call site;
/// there is no process-wide singleton.
pub struct ExtensionManager {
    registry: ExtensionRegistry,
    host: HostContext,
}

impl ExtensionManager {
    /// Create a manager around a host context
    pub fn new(host: HostContext) -> Self {
        Self {
            registry: ExtensionRegistry::new(),
            host,
        }
    }

    /// The shared host context
    pub fn host(&self) -> &HostContext {
        &self.host
    }

    // ── Registry operations ──────────────────────────────────────────

    /// Register an extension instance with its metadata
    pub fn add_instance(
        &mut self,
        id: impl Into<String>,
        info: ExtensionInfo,
        instance: Box<dyn Extension>,
    ) -> Result<()> {
        self.registry.add_instance(id, info, instance)
    }

    /// Remove a registry entry without running `on_uninit`.
    ///
    /// Unloading first is the caller's responsibility; see
    /// [`unload_extensions`](Self::unload_extensions).
    pub fn remove_instance(&mut self, id: &str) -> Result<()> {
        self.registry.remove_instance(id).map(|_| ())
    }

    /// Extension metadata lookup
    pub fn info(&self, id: &str) -> Result<&ExtensionInfo> {
        self.registry.info(id)
    }

    /// Mutable handle to a live instance
    pub fn instance_mut(&mut self, id: &str) -> Result<&mut Box<dyn Extension>> {
        self.registry.instance_mut(id)
    }

    /// Whether an id is registered
    pub fn exist(&self, id: &str) -> bool {
        self.registry.exist(id)
    }

    /// Set an extension's load flag directly
    pub fn set_load_status(&mut self, id: &str, status: bool) -> Result<()> {
        self.registry.set_load_status(id, status)
    }

    /// Read an extension's load flag
    pub fn load_status(&self, id: &str) -> Result<bool> {
        self.registry.load_status(id)
    }

    /// Ids of currently loaded extensions (order not part of the contract)
    pub fn loaded_extensions(&self) -> Vec<String> {
        self.registry.loaded_extensions()
    }

    // ── Plan computation ─────────────────────────────────────────────

    /// Compute the load order for a request without executing it
    pub fn extension_load_order(
        &self,
        requested: &[ExtensionLoadInfo],
    ) -> Result<Vec<ExtensionLoadInfo>> {
        DependencyResolver::new(&self.registry).load_order(requested)
    }

    /// Compute the unload order for a set of ids without executing it
    pub fn extension_unload_order(&self, extensions: &[String]) -> Result<Vec<String>> {
        DependencyResolver::new(&self.registry).unload_order(extensions)
    }

    // ── Batch lifecycle ──────────────────────────────────────────────

    /// Load a set of extensions with their requested modes.
    ///
    /// Resolution errors abort the whole batch before any entry runs. Once
    /// execution starts, each entry is its own unit of failure: an entry
    /// that fails aborts the remaining entries, but extensions already
    /// loaded stay loaded. Already-loaded entries are skipped, so repeating
    /// a fully-satisfied request is a no-op.
    ///
    /// Returns the ids newly loaded by this call, in load order.
    pub async fn load_extensions_with_mode(
        &mut self,
        requested: &[ExtensionLoadInfo],
        loader: &mut dyn ExtensionLoader,
    ) -> Result<Vec<String>> {
        let plan = self.extension_load_order(requested)?;
        let mut newly_loaded = Vec::new();

        for entry in &plan {
            if self.registry.load_status(&entry.id)? {
                debug!(extension = %entry.id, "already loaded, skipping");
                continue;
            }

            loader
                .load(entry)
                .await
                .map_err(|e| Error::hook(&entry.id, "load", e.to_string()))?;

            self.registry
                .instance_mut(&entry.id)?
                .on_init(&self.host)
                .await
                .map_err(|e| Error::hook(&entry.id, "on_init", e.to_string()))?;

            self.registry.set_load_status(&entry.id, true)?;
            info!(extension = %entry.id, mode = %entry.mode, "extension loaded");
            newly_loaded.push(entry.id.clone());

            let envelope = EventEnvelope::new(
                Some(entry.id.clone()),
                ExtensionEvent::Init {
                    id: entry.id.clone(),
                },
            );
            self.announce(envelope).await;
        }

        Ok(newly_loaded)
    }

    /// Unload a set of extensions in reverse-dependency order.
    ///
    /// Entries that are unknown or not loaded are dropped from the plan. An
    /// `on_uninit` failure aborts the remaining entries and leaves the
    /// failing extension loaded. Registry entries are retained; dropping
    /// them stays the caller's policy via [`remove_instance`](Self::remove_instance).
    ///
    /// Returns the ids actually unloaded, in unload order.
    pub async fn unload_extensions(&mut self, extensions: &[String]) -> Result<Vec<String>> {
        let plan = self.extension_unload_order(extensions)?;
        let mut unloaded = Vec::new();

        for id in &plan {
            if !self.registry.load_status(id)? {
                continue;
            }

            self.registry
                .instance_mut(id)?
                .on_uninit(&self.host)
                .await
                .map_err(|e| Error::hook(id, "on_uninit", e.to_string()))?;

            self.registry.set_load_status(id, false)?;
            info!(extension = %id, "extension unloaded");
            unloaded.push(id.clone());

            let envelope = EventEnvelope::new(
                Some(id.clone()),
                ExtensionEvent::Uninit { id: id.clone() },
            );
            self.announce(envelope).await;
        }

        Ok(unloaded)
    }

    /// Unload every currently loaded extension
    pub async fn unload_all(&mut self) -> Result<Vec<String>> {
        let loaded = self.registry.loaded_extensions();
        self.unload_extensions(&loaded).await
    }

    // ── Event dispatch ───────────────────────────────────────────────

    /// Dispatch an event to a single extension.
    ///
    /// Fails with `NotFound` if the id is unregistered; silently does
    /// nothing if the extension's hook set does not admit events.
    pub async fn emit_event_to_extension(
        &mut self,
        id: &str,
        event: &ExtensionEvent,
    ) -> Result<()> {
        let instance = self.registry.instance_mut(id)?;
        if !instance.hooks().contains(HookSet::EVENTS) {
            debug!(extension = %id, event = %event.name(), "no event handler, skipping");
            return Ok(());
        }
        instance
            .on_event(event)
            .await
            .map_err(|e| Error::hook(id, "on_event", e.to_string()))
    }

    /// Broadcast an event to every loaded extension in load order.
    ///
    /// A handler failure in one extension never prevents delivery to the
    /// others; failures are collected in the returned report.
    pub async fn emit_event_to_all(&mut self, event: &ExtensionEvent) -> DispatchReport {
        self.dispatch_to_loaded(event, None).await
    }

    /// Alias for [`emit_event_to_all`](Self::emit_event_to_all)
    pub async fn emit_event(&mut self, event: &ExtensionEvent) -> DispatchReport {
        self.emit_event_to_all(event).await
    }

    async fn dispatch_to_loaded(
        &mut self,
        event: &ExtensionEvent,
        except: Option<&str>,
    ) -> DispatchReport {
        let targets: Vec<String> = self
            .registry
            .load_order()
            .iter()
            .filter(|id| except != Some(id.as_str()))
            .cloned()
            .collect();

        let mut report = DispatchReport::default();
        for id in targets {
            // The loaded set cannot change mid-broadcast, but stay defensive
            let Ok(instance) = self.registry.instance_mut(&id) else {
                continue;
            };
            if !instance.hooks().contains(HookSet::EVENTS) {
                continue;
            }
            match instance.on_event(event).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(extension = %id, event = %event.name(), "event handler failed: {e}");
                    let error = Error::hook(&id, "on_event", e.to_string());
                    report.failures.push(DispatchFailure { id, error });
                }
            }
        }
        report
    }

    /// Broadcast a lifecycle envelope, excluding its subject
    async fn announce(&mut self, envelope: EventEnvelope) {
        let subject = envelope.extension_id.clone();
        let report = self
            .dispatch_to_loaded(&envelope.event, subject.as_deref())
            .await;
        if !report.is_clean() {
            for failure in &report.failures {
                warn!(
                    extension = %failure.id,
                    event_id = %envelope.event_id,
                    "lifecycle event delivery failed: {}",
                    failure.error
                );
            }
        }
    }

    // ── Global functions and settings ────────────────────────────────

    /// Register a cross-extension callable; last writer wins
    pub async fn register_global_function(&self, name: impl Into<String>, func: GlobalFunction) {
        self.host.register_global_function(name, func).await;
    }

    /// Remove a global function
    pub async fn unregister_global_function(&self, name: &str) -> Result<()> {
        self.host.unregister_global_function(name).await
    }

    /// Call a global function by name
    pub async fn call_global_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.host.call_global_function(name, args).await
    }

    /// Register an extension's settings schema
    pub async fn register_settings_schema(&self, id: impl Into<String>, items: Vec<SettingsItem>) {
        self.host.register_settings_schema(id, items).await;
    }

    /// The full settings blob for an extension
    pub async fn settings(&self, id: &str) -> Result<Value> {
        self.host.settings(id).await
    }

    /// Write a single setting, then announce the change to loaded extensions
    pub async fn set_setting_item(&mut self, id: &str, key: &str, value: Value) -> Result<()> {
        self.host.set_setting_item(id, key, value).await?;
        let event = ExtensionEvent::SettingsChanged {
            id: id.to_string(),
            key: key.to_string(),
        };
        let report = self.emit_event_to_all(&event).await;
        for failure in &report.failures {
            warn!(
                extension = %failure.id,
                setting = %key,
                "settings change notification failed: {}",
                failure.error
            );
        }
        Ok(())
    }

    // ── Project hooks ────────────────────────────────────────────────

    /// Run `before_project_load` on every loaded extension in load order.
    ///
    /// `extensions` lists the ids recorded in the project being opened. The
    /// first hook failure aborts the sequence: project data must not be
    /// handed to the VM half-transformed.
    pub async fn before_project_load(
        &mut self,
        data: &mut Value,
        extensions: &[String],
    ) -> Result<()> {
        let targets = self.registry.load_order().to_vec();
        for id in targets {
            let instance = self.registry.instance_mut(&id)?;
            if !instance.hooks().contains(HookSet::PROJECT_LOAD) {
                continue;
            }
            instance
                .before_project_load(data, extensions)
                .await
                .map_err(|e| Error::hook(&id, "before_project_load", e.to_string()))?;
        }
        Ok(())
    }

    /// Run `before_project_save` on every loaded extension in load order.
    /// Same abort-on-first-failure policy as project load.
    pub async fn before_project_save(&mut self, data: &mut Value) -> Result<()> {
        let targets = self.registry.load_order().to_vec();
        for id in targets {
            let instance = self.registry.instance_mut(&id)?;
            if !instance.hooks().contains(HookSet::PROJECT_SAVE) {
                continue;
            }
            instance
                .before_project_save(data)
                .await
                .map_err(|e| Error::hook(&id, "before_project_save", e.to_string()))?;
        }
        Ok(())
    }
}
