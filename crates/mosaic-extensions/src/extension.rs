//! Extension trait definitions
//!
//! An extension is a polymorphic unit of behavior with async lifecycle hooks.
//! Instead of an inheritance hierarchy, each instance reports the hooks it
//! actually implements through a [`HookSet`]; the manager dispatches by
//! capability check and treats unsupported hooks as no-ops.

use async_trait::async_trait;
use mosaic_core::Result;
use serde_json::Value;

use crate::events::ExtensionEvent;
use crate::host::HostContext;

/// Bitset of lifecycle hooks an extension supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSet(u8);

impl HookSet {
    pub const INIT: HookSet = HookSet(1 << 0);
    pub const UNINIT: HookSet = HookSet(1 << 1);
    pub const PROJECT_LOAD: HookSet = HookSet(1 << 2);
    pub const PROJECT_SAVE: HookSet = HookSet(1 << 3);
    pub const EVENTS: HookSet = HookSet(1 << 4);

    /// The full modern hook set
    pub const FULL: HookSet = HookSet(0b1_1111);

    /// No hooks at all
    pub const EMPTY: HookSet = HookSet(0);

    /// Whether every hook in `other` is present in `self`
    pub const fn contains(self, other: HookSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two hook sets
    pub const fn union(self, other: HookSet) -> HookSet {
        HookSet(self.0 | other.0)
    }
}

impl std::ops::BitOr for HookSet {
    type Output = HookSet;

    fn bitor(self, rhs: HookSet) -> HookSet {
        self.union(rhs)
    }
}

/// Lifecycle contract for an extension instance.
///
/// The manager guarantees *when* each hook fires relative to load/unload
/// ordering; side effects within a hook are the extension author's
/// responsibility. Hooks may perform asynchronous work; the manager awaits
/// each one to completion before moving to the next extension in a batch.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Called once when the extension is activated, after every non-optional
    /// dependency has been initialized.
    async fn on_init(&mut self, ctx: &HostContext) -> Result<()>;

    /// Called when the extension is deactivated, before any of its
    /// dependencies are torn down.
    async fn on_uninit(&mut self, _ctx: &HostContext) -> Result<()> {
        Ok(())
    }

    /// Called before project data is handed to the VM. `extensions` lists the
    /// ids recorded in the project being opened.
    async fn before_project_load(&mut self, _data: &mut Value, _extensions: &[String]) -> Result<()> {
        Ok(())
    }

    /// Called before project data is serialized for saving.
    async fn before_project_save(&mut self, _data: &mut Value) -> Result<()> {
        Ok(())
    }

    /// Called for each dispatched event the extension's hook set admits.
    async fn on_event(&mut self, _event: &ExtensionEvent) -> Result<()> {
        Ok(())
    }

    /// The hooks this instance supports. Defaults to the full set.
    fn hooks(&self) -> HookSet {
        HookSet::FULL
    }
}

impl std::fmt::Debug for Box<dyn Extension> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Box<dyn Extension>").finish_non_exhaustive()
    }
}

/// Legacy init function signature used by [`CompatibleExtension`]
pub type LegacyInit = Box<dyn FnMut(&HostContext) -> Result<()> + Send + Sync>;

/// Shim for legacy extensions that only expose an init entry point.
///
/// All other hooks are no-ops and the reported hook set contains only
/// `INIT`, so the manager never routes events or project hooks here.
pub struct CompatibleExtension {
    init: LegacyInit,
}

impl CompatibleExtension {
    pub fn new(init: impl FnMut(&HostContext) -> Result<()> + Send + Sync + 'static) -> Self {
        Self {
            init: Box::new(init),
        }
    }
}

#[async_trait]
impl Extension for CompatibleExtension {
    async fn on_init(&mut self, ctx: &HostContext) -> Result<()> {
        (self.init)(ctx)
    }

    fn hooks(&self) -> HookSet {
        HookSet::INIT
    }
}
