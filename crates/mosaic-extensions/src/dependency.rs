//! Dependency resolution using topological sort with DFS
//!
//! The resolver derives a directed "requires" graph from the dependency maps
//! of the registered extensions and computes load plans over it. The graph is
//! built fresh per resolution call from the current registry state, never
//! persisted.

use mosaic_core::types::{ExtensionLoadInfo, LoadMode};
use mosaic_core::{Error, Result};
use semver::{Version, VersionReq};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::registry::ExtensionRegistry;

/// One dependency edge as seen by the resolver
struct DependencyEdge {
    id: String,
    requirement: String,
    optional: bool,
}

/// Snapshot of one registered extension
struct ResolverNode {
    version: String,
    loaded: bool,
    edges: Vec<DependencyEdge>,
}

/// Dependency resolver using DFS-based topological sort.
///
/// Load order places every extension strictly after its required
/// dependencies; unload order is the reverse. Independent extensions keep
/// the relative order of the request, so plans are deterministic across runs
/// for the same input.
pub struct DependencyResolver {
    nodes: HashMap<String, ResolverNode>,
}

impl DependencyResolver {
    /// Create a new dependency resolver from an extension registry.
    ///
    /// An edge counts as optional when the dependant declared it so, or when
    /// the dependency itself is registered with `optional: true` metadata.
    pub fn new(registry: &ExtensionRegistry) -> Self {
        let mut nodes = HashMap::new();
        for (id, entry) in registry.entries() {
            let mut edges: Vec<DependencyEdge> = entry
                .info
                .dependency
                .iter()
                .map(|(dep_id, spec)| DependencyEdge {
                    id: dep_id.clone(),
                    requirement: spec.requirement().to_string(),
                    optional: spec.is_optional()
                        || registry.info(dep_id).map(|i| i.optional).unwrap_or(false),
                })
                .collect();
            // The dependency map has no inherent order; sort edges so DFS
            // emission is deterministic.
            edges.sort_by(|a, b| a.id.cmp(&b.id));

            nodes.insert(
                id.clone(),
                ResolverNode {
                    version: entry.info.version.clone(),
                    loaded: entry.loaded,
                    edges,
                },
            );
        }
        Self { nodes }
    }

    /// Resolve the order in which the requested extensions must be loaded.
    ///
    /// Dependencies pulled in without being separately requested are tagged
    /// `PassiveLoad`; requested ids keep the mode the caller supplied.
    /// Optional dependencies that are absent or version-incompatible are
    /// skipped; required ones fail with `UnavailableExtension` (0x90). A
    /// cycle fails with `CircularRequirement` (0x91) naming the cycle path.
    pub fn load_order(&self, requested: &[ExtensionLoadInfo]) -> Result<Vec<ExtensionLoadInfo>> {
        let mut modes: HashMap<&str, LoadMode> = HashMap::new();
        for entry in requested {
            if entry.mode == LoadMode::Unload {
                warn!(extension = %entry.id, "unload entry in load request, ignoring");
                continue;
            }
            modes.insert(entry.id.as_str(), entry.mode);
        }

        let mut resolved = Vec::new();
        let mut seen = HashSet::new();
        let mut visiting = Vec::new();

        for entry in requested {
            if entry.mode == LoadMode::Unload {
                continue;
            }
            if !self.nodes.contains_key(&entry.id) {
                return Err(Error::unavailable_extension(&entry.id, "*"));
            }
            self.visit(&entry.id, &mut resolved, &mut seen, &mut visiting)?;
        }

        debug!(order = ?resolved, "resolved extension load order");
        Ok(resolved
            .into_iter()
            .map(|id| {
                let mode = modes
                    .get(id.as_str())
                    .copied()
                    .unwrap_or(LoadMode::PassiveLoad);
                ExtensionLoadInfo { id, mode }
            })
            .collect())
    }

    /// Visit an extension node using DFS, emitting it in post-order
    fn visit(
        &self,
        id: &str,
        resolved: &mut Vec<String>,
        seen: &mut HashSet<String>,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        // Cycle detection: the id is already on the traversal stack
        if let Some(pos) = visiting.iter().position(|v| v == id) {
            let mut cycle: Vec<String> = visiting[pos..].to_vec();
            cycle.push(id.to_string());
            return Err(Error::circular_requirement(cycle));
        }

        // Already resolved
        if seen.contains(id) {
            return Ok(());
        }

        visiting.push(id.to_string());

        // Only called for ids known to be present
        let node = &self.nodes[id];
        for edge in &node.edges {
            match self.nodes.get(&edge.id) {
                None => {
                    if edge.optional {
                        debug!(
                            extension = %id,
                            dependency = %edge.id,
                            "optional dependency absent, skipping"
                        );
                        continue;
                    }
                    return Err(Error::unavailable_extension(&edge.id, &edge.requirement));
                }
                Some(dep) => {
                    if !requirement_matches(&dep.version, &edge.requirement)? {
                        if edge.optional {
                            debug!(
                                extension = %id,
                                dependency = %edge.id,
                                requirement = %edge.requirement,
                                version = %dep.version,
                                "optional dependency version-incompatible, skipping"
                            );
                            continue;
                        }
                        return Err(Error::unavailable_extension(&edge.id, &edge.requirement));
                    }
                    self.visit(&edge.id, resolved, seen, visiting)?;
                }
            }
        }

        visiting.pop();
        seen.insert(id.to_string());
        resolved.push(id.to_string());

        Ok(())
    }

    /// Resolve the order in which the given extensions must be unloaded.
    ///
    /// The graph is restricted to currently-loaded ids intersected with the
    /// input; the result is the reverse of a topological sort, so every
    /// listed dependant precedes its dependencies. Ids that are unknown or
    /// not loaded are dropped from the plan. The cycle check remains, since
    /// the loaded set can have been mutated since load time.
    pub fn unload_order(&self, extensions: &[String]) -> Result<Vec<String>> {
        let mut targets: Vec<&str> = Vec::new();
        let mut target_set: HashSet<&str> = HashSet::new();
        for id in extensions {
            let loaded = self.nodes.get(id.as_str()).map(|n| n.loaded).unwrap_or(false);
            if loaded && target_set.insert(id.as_str()) {
                targets.push(id.as_str());
            }
        }

        let mut resolved = Vec::new();
        let mut seen = HashSet::new();
        let mut visiting = Vec::new();

        for id in &targets {
            self.visit_restricted(id, &target_set, &mut resolved, &mut seen, &mut visiting)?;
        }

        resolved.reverse();
        debug!(order = ?resolved, "resolved extension unload order");
        Ok(resolved)
    }

    /// DFS over the graph restricted to `targets`
    fn visit_restricted(
        &self,
        id: &str,
        targets: &HashSet<&str>,
        resolved: &mut Vec<String>,
        seen: &mut HashSet<String>,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(pos) = visiting.iter().position(|v| v == id) {
            let mut cycle: Vec<String> = visiting[pos..].to_vec();
            cycle.push(id.to_string());
            return Err(Error::circular_requirement(cycle));
        }
        if seen.contains(id) {
            return Ok(());
        }

        visiting.push(id.to_string());
        for edge in &self.nodes[id].edges {
            if targets.contains(edge.id.as_str()) {
                self.visit_restricted(&edge.id, targets, resolved, seen, visiting)?;
            }
        }
        visiting.pop();

        seen.insert(id.to_string());
        resolved.push(id.to_string());
        Ok(())
    }
}

/// Check a candidate version against a dependency requirement.
///
/// An empty requirement or `"*"` accepts any version.
fn requirement_matches(version: &str, requirement: &str) -> Result<bool> {
    if requirement.is_empty() || requirement == "*" {
        return Ok(true);
    }
    let req = VersionReq::parse(requirement)
        .map_err(|_| Error::invalid_version(requirement))?;
    let ver = Version::parse(version).map_err(|_| Error::invalid_version(version))?;
    Ok(req.matches(&ver))
}
