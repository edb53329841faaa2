//! Recording extension and loader implementations
//!
//! Every hook call is appended to a shared log as `"{id}:{hook}"`, so tests
//! can assert on ordering across extensions, not just per-instance counts.

use async_trait::async_trait;
use mosaic_core::types::ExtensionLoadInfo;
use mosaic_core::{Error, Result};
use mosaic_extensions::{Extension, ExtensionLoader, HookSet, HostContext};
use mosaic_extensions::events::ExtensionEvent;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Shared, ordered record of hook invocations
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Extension that records every hook call to a shared log.
///
/// `failing_hook` makes exactly one hook return an error, for exercising
/// abort and partial-delivery paths.
pub struct RecordingExtension {
    id: String,
    log: CallLog,
    hooks: HookSet,
    failing_hook: Option<&'static str>,
}

impl RecordingExtension {
    pub fn new(id: impl Into<String>, log: CallLog) -> Self {
        Self {
            id: id.into(),
            log,
            hooks: HookSet::FULL,
            failing_hook: None,
        }
    }

    /// Restrict the reported hook set
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Make the named hook fail
    pub fn failing_on(mut self, hook: &'static str) -> Self {
        self.failing_hook = Some(hook);
        self
    }

    pub fn boxed(self) -> Box<dyn Extension> {
        Box::new(self)
    }

    fn record(&self, hook: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("{}:{hook}", self.id));
        if self.failing_hook == Some(hook) {
            return Err(Error::hook(&self.id, hook, "induced failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Extension for RecordingExtension {
    async fn on_init(&mut self, _ctx: &HostContext) -> Result<()> {
        self.record("on_init")
    }

    async fn on_uninit(&mut self, _ctx: &HostContext) -> Result<()> {
        self.record("on_uninit")
    }

    async fn before_project_load(&mut self, data: &mut Value, extensions: &[String]) -> Result<()> {
        self.record("before_project_load")?;
        if let Some(touched) = data["touched_by"].as_array_mut() {
            touched.push(json!(self.id.clone()));
        }
        data["project_extensions"] = json!(extensions);
        Ok(())
    }

    async fn before_project_save(&mut self, data: &mut Value) -> Result<()> {
        self.record("before_project_save")?;
        data["saved_by"] = json!(self.id.clone());
        Ok(())
    }

    async fn on_event(&mut self, event: &ExtensionEvent) -> Result<()> {
        self.record(&format!("on_event({})", event.name()))
    }

    fn hooks(&self) -> HookSet {
        self.hooks
    }
}

/// Loader that records activation order; optionally fails for one id
pub struct RecordingLoader {
    log: CallLog,
    failing_id: Option<String>,
}

impl RecordingLoader {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            failing_id: None,
        }
    }

    pub fn failing_for(mut self, id: impl Into<String>) -> Self {
        self.failing_id = Some(id.into());
        self
    }
}

#[async_trait]
impl ExtensionLoader for RecordingLoader {
    async fn load(&mut self, entry: &ExtensionLoadInfo) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("{}:load", entry.id));
        if self.failing_id.as_deref() == Some(entry.id.as_str()) {
            anyhow::bail!("activation refused for {}", entry.id);
        }
        Ok(())
    }
}
