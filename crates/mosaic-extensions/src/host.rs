//! Host context threaded through extension hooks
//!
//! There is no ambient singleton: the host shell constructs one
//! [`HostContext`], hands it to the [`ExtensionManager`](crate::manager::ExtensionManager),
//! and every hook receives a borrow of it. The context exposes the narrow
//! boundary surface extensions are allowed to touch during `on_init` /
//! `on_uninit`: opaque capability handles into the host shell, the
//! block/category registration tables, the global function table, and
//! settings access.
//!
//! Rendering of blocks, menus, and categories belongs to the editor; the
//! tables here only carry the declarations.

use mosaic_core::types::{BlockPrototype, CategoryPrototype, SettingsItem};
use mosaic_core::{Error, Result};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::settings::SettingsStore;

/// Opaque capability handle into the host shell (VM, GUI, block editor,
/// stage canvas). The manager never looks inside; extensions that know the
/// concrete type may downcast.
#[derive(Clone)]
pub struct HostHandle {
    name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostHandle {
    pub fn new(name: &'static str, inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self { name, inner }
    }

    /// The handle's role name ("vm", "gui", ...)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Downcast to the concrete collaborator type
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandle").field("name", &self.name).finish()
    }
}

/// Cross-extension callable registered under a global name
pub type GlobalFunction = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Shared host services available to extensions during hooks.
///
/// Interior mutability keeps hook signatures at `&HostContext` while the
/// manager holds mutable borrows of extension instances; all public
/// operations still run to completion within one turn of the host's event
/// loop.
#[derive(Default)]
pub struct HostContext {
    vm: Option<HostHandle>,
    gui: Option<HostHandle>,
    gui_document: Option<HostHandle>,
    blocks: Option<HostHandle>,
    stage_canvas: Option<HostHandle>,

    categories: RwLock<HashMap<String, CategoryPrototype>>,
    block_table: RwLock<HashMap<String, BlockPrototype>>,
    extension_apis: RwLock<Vec<Value>>,
    global_functions: RwLock<HashMap<String, GlobalFunction>>,
    settings: RwLock<SettingsStore>,
}

impl HostContext {
    /// Create a context with no capability handles attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the VM handle
    pub fn with_vm(mut self, handle: HostHandle) -> Self {
        self.vm = Some(handle);
        self
    }

    /// Attach the GUI handle
    pub fn with_gui(mut self, handle: HostHandle) -> Self {
        self.gui = Some(handle);
        self
    }

    /// Attach the GUI document handle
    pub fn with_gui_document(mut self, handle: HostHandle) -> Self {
        self.gui_document = Some(handle);
        self
    }

    /// Attach the block editor handle
    pub fn with_blocks(mut self, handle: HostHandle) -> Self {
        self.blocks = Some(handle);
        self
    }

    /// Attach the stage canvas handle
    pub fn with_stage_canvas(mut self, handle: HostHandle) -> Self {
        self.stage_canvas = Some(handle);
        self
    }

    // ── Capability handles ───────────────────────────────────────────

    pub fn vm_instance(&self) -> Result<HostHandle> {
        self.vm.clone().ok_or_else(|| Error::not_found("vm"))
    }

    pub fn gui_instance(&self) -> Result<HostHandle> {
        self.gui.clone().ok_or_else(|| Error::not_found("gui"))
    }

    pub fn gui_document(&self) -> Result<HostHandle> {
        self.gui_document
            .clone()
            .ok_or_else(|| Error::not_found("gui_document"))
    }

    pub fn block_instance(&self) -> Result<HostHandle> {
        self.blocks.clone().ok_or_else(|| Error::not_found("blocks"))
    }

    pub fn stage_canvas(&self) -> Result<HostHandle> {
        self.stage_canvas
            .clone()
            .ok_or_else(|| Error::not_found("stage_canvas"))
    }

    // ── Block and category surface ───────────────────────────────────

    /// Register an extension API object with the host shell.
    /// Registrations accumulate in order; the host reads the whole list when
    /// rebuilding its surface.
    pub async fn regist_extension_api(&self, api: Value) {
        self.extension_apis.write().await.push(api);
    }

    /// Registered API objects, in registration order
    pub async fn extension_apis(&self) -> Vec<Value> {
        self.extension_apis.read().await.clone()
    }

    /// Add a category. Re-registering a category id replaces it.
    pub async fn add_category(&self, category: CategoryPrototype) {
        debug!(category = %category.category_id, "category registered");
        self.categories
            .write()
            .await
            .insert(category.category_id.clone(), category);
    }

    /// Remove a category. Fails with `NotFound` for an unknown id.
    pub async fn remove_category(&self, category_id: &str) -> Result<()> {
        self.categories
            .write()
            .await
            .remove(category_id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(category_id))
    }

    /// Add a block declaration. Re-registering an opcode replaces it.
    pub async fn add_block(&self, block: BlockPrototype) {
        debug!(opcode = %block.opcode, "block registered");
        self.block_table
            .write()
            .await
            .insert(block.opcode.clone(), block);
    }

    /// Add several block declarations
    pub async fn add_blocks(&self, blocks: Vec<BlockPrototype>) {
        for block in blocks {
            self.add_block(block).await;
        }
    }

    /// Remove a block declaration. Fails with `NotFound` for an unknown opcode.
    pub async fn remove_block(&self, opcode: &str) -> Result<()> {
        self.block_table
            .write()
            .await
            .remove(opcode)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(opcode))
    }

    /// Remove several block declarations; stops at the first unknown opcode
    pub async fn remove_blocks(&self, opcodes: &[String]) -> Result<()> {
        for opcode in opcodes {
            self.remove_block(opcode).await?;
        }
        Ok(())
    }

    /// Currently registered block opcodes, sorted
    pub async fn block_opcodes(&self) -> Vec<String> {
        let mut opcodes: Vec<String> = self.block_table.read().await.keys().cloned().collect();
        opcodes.sort();
        opcodes
    }

    /// Currently registered category ids, sorted
    pub async fn category_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.categories.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ── Global functions ─────────────────────────────────────────────

    /// Register a function under a global name for cross-extension calls.
    ///
    /// Duplicate registration overwrites silently; last writer wins. This is
    /// a deliberate design choice so a re-initializing extension can replace
    /// its own entry without an unregister round trip.
    pub async fn register_global_function(&self, name: impl Into<String>, func: GlobalFunction) {
        let name = name.into();
        let mut table = self.global_functions.write().await;
        if table.insert(name.clone(), func).is_some() {
            debug!(function = %name, "global function overwritten");
        }
    }

    /// Remove a global function. Fails with `NotFound` for an unknown name.
    pub async fn unregister_global_function(&self, name: &str) -> Result<()> {
        self.global_functions
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(name))
    }

    /// Call a global function by name.
    ///
    /// The callable runs outside the table lock, so it may itself register
    /// or call other global functions.
    pub async fn call_global_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self
            .global_functions
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))?;
        func(args)
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Register the settings schema for an extension
    pub async fn register_settings_schema(&self, id: impl Into<String>, items: Vec<SettingsItem>) {
        self.settings.write().await.register_schema(id, items);
    }

    /// Read the persisted settings blob for an extension id
    pub async fn settings(&self, id: &str) -> Result<Value> {
        self.settings.read().await.settings(id)
    }

    /// Read a single setting
    pub async fn setting_item(&self, id: &str, key: &str) -> Result<Value> {
        self.settings.read().await.get_item(id, key)
    }

    /// Write a single setting, validated against the schema
    pub async fn set_setting_item(&self, id: &str, key: &str, value: Value) -> Result<()> {
        self.settings.write().await.set_item(id, key, value)
    }
}
