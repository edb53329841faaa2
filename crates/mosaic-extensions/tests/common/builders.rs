//! Builders for extension metadata and populated managers

use mosaic_core::types::{ExtensionInfo, ExtensionLoadInfo};
use mosaic_extensions::{ExtensionManager, ExtensionRegistry, HostContext, HookSet};

use super::test_extensions::{CallLog, RecordingExtension};

/// Metadata at version 1.0.0 with the given required dependencies (any version)
pub fn info_with_deps(id: &str, deps: &[&str]) -> ExtensionInfo {
    deps.iter().fold(ExtensionInfo::new(id, "1.0.0", 1), |info, dep| {
        info.with_dependency(*dep, "*")
    })
}

/// Manager populated with recording extensions, one per `(id, deps)` pair
pub fn manager_with(graph: &[(&str, &[&str])], log: &CallLog) -> ExtensionManager {
    let mut manager = ExtensionManager::new(HostContext::new());
    for (id, deps) in graph {
        manager
            .add_instance(
                *id,
                info_with_deps(id, deps),
                RecordingExtension::new(*id, log.clone()).boxed(),
            )
            .unwrap();
    }
    manager
}

/// Registry populated the same way, for resolver-only tests
pub fn registry_with(graph: &[(&str, &[&str])], log: &CallLog) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    for (id, deps) in graph {
        registry
            .add_instance(
                *id,
                info_with_deps(id, deps),
                RecordingExtension::new(*id, log.clone()).boxed(),
            )
            .unwrap();
    }
    registry
}

/// Register one extension with an explicit hook set
pub fn add_with_hooks(
    manager: &mut ExtensionManager,
    id: &str,
    hooks: HookSet,
    log: &CallLog,
) {
    manager
        .add_instance(
            id,
            info_with_deps(id, &[]),
            RecordingExtension::new(id, log.clone())
                .with_hooks(hooks)
                .boxed(),
        )
        .unwrap();
}

/// Initiative load-request entries for a list of ids
pub fn request(ids: &[&str]) -> Vec<ExtensionLoadInfo> {
    ids.iter().map(|id| ExtensionLoadInfo::initiative(*id)).collect()
}

/// Owned id list, for unload calls
pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
}
