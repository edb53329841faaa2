//! Typed extension events and dispatch reporting
//!
//! The original host passed loosely-typed `(event, ...args)` pairs between
//! extensions. Here every event name is a variant with a typed payload, so a
//! malformed argument list is unrepresentable rather than a runtime surprise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extension lifecycle and broadcast events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtensionEvent {
    /// An extension finished initializing
    Init { id: String },

    /// An extension was torn down
    Uninit { id: String },

    /// Project data is about to be handed to the VM
    ProjectLoading { extensions: Vec<String> },

    /// Project data is about to be serialized
    ProjectSaving,

    /// A persisted setting changed
    SettingsChanged { id: String, key: String },

    /// Extension-defined event with an arbitrary JSON payload
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

impl ExtensionEvent {
    /// Event name as dispatched, matching the serde tag
    pub fn name(&self) -> &str {
        match self {
            ExtensionEvent::Init { .. } => "init",
            ExtensionEvent::Uninit { .. } => "uninit",
            ExtensionEvent::ProjectLoading { .. } => "project_loading",
            ExtensionEvent::ProjectSaving => "project_saving",
            ExtensionEvent::SettingsChanged { .. } => "settings_changed",
            ExtensionEvent::Custom { name, .. } => name,
        }
    }
}

/// Event metadata envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID (UUID v4)
    pub event_id: String,

    /// Event timestamp (UTC)
    pub timestamp: DateTime<Utc>,

    /// Extension the event concerns, if any
    pub extension_id: Option<String>,

    /// Host version that published the event
    pub host_version: String,

    /// The actual event payload
    pub event: ExtensionEvent,
}

impl EventEnvelope {
    pub fn new(extension_id: Option<String>, event: ExtensionEvent) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            extension_id,
            host_version: env!("CARGO_PKG_VERSION").to_string(),
            event,
        }
    }
}

/// One failed delivery during a broadcast
#[derive(Debug)]
pub struct DispatchFailure {
    /// Extension whose handler failed
    pub id: String,

    /// The hook error
    pub error: mosaic_core::Error,
}

/// Outcome of a broadcast: handler failures are collected here instead of
/// aborting delivery to sibling extensions.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of extensions whose handler ran to completion
    pub delivered: usize,

    /// Extensions whose handler returned an error
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    /// True when every delivery succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
