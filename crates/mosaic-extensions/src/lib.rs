//! Extension management for the Mosaic host
//!
//! This crate handles:
//! - The extension registry (metadata, live instances, load flags)
//! - Dependency resolution and load/unload ordering
//! - Lifecycle orchestration with async hooks
//! - Typed event dispatch with aggregated failure reporting
//! - Global function registration for cross-extension calls
//! - Project-data migration across extension version upgrades
//! - Per-extension settings storage with schema validation

pub mod dependency;
pub mod events;
pub mod extension;
pub mod host;
pub mod manager;
pub mod migration;
pub mod registry;
pub mod settings;

pub use dependency::DependencyResolver;
pub use events::{DispatchFailure, DispatchReport, EventEnvelope, ExtensionEvent};
pub use extension::{CompatibleExtension, Extension, HookSet};
pub use host::{GlobalFunction, HostContext, HostHandle};
pub use manager::{ExtensionLoader, ExtensionManager, NullLoader};
pub use migration::{migrate_change_block, MigrationHelper, MigrationScript};
pub use registry::{ExtensionRegistry, RegistryEntry};
pub use settings::SettingsStore;
