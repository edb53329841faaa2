//! Project-data migration across extension version upgrades
//!
//! Extensions register `(source version → target version)` transformation
//! scripts; opening a project saved under an older extension version walks
//! the chain of scripts connecting the two versions and applies them in
//! sequence. The version graph is directed and may contain multiple
//! outgoing edges per version, so resolution picks the shortest chain.

use mosaic_core::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// A pure transform taking project data at the source version and returning
/// the data shaped for the target version.
pub type MigrationScript = Box<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Rewrite a block opcode across a project's targets.
///
/// Intended for use inside migration scripts when an extension renames a
/// block between versions. `targets` is the project's target list (an array,
/// or a map keyed by target name); every block whose `opcode` equals
/// `src_opcode` is rewritten to `dst_opcode`. Returns the number of blocks
/// rewritten.
pub fn migrate_change_block(targets: &mut Value, src_opcode: &str, dst_opcode: &str) -> usize {
    let target_values: Vec<&mut Value> = match targets {
        Value::Array(list) => list.iter_mut().collect(),
        Value::Object(map) => map.values_mut().collect(),
        _ => return 0,
    };

    let mut changed = 0;
    for target in target_values {
        let Some(blocks) = target.get_mut("blocks").and_then(Value::as_object_mut) else {
            continue;
        };
        for block in blocks.values_mut() {
            if block.get("opcode").and_then(Value::as_str) == Some(src_opcode) {
                block["opcode"] = Value::String(dst_opcode.to_string());
                changed += 1;
            }
        }
    }

    if changed > 0 {
        debug!(src = %src_opcode, dst = %dst_opcode, blocks = changed, "block opcode migrated");
    }
    changed
}

/// Registry and resolver for version-migration chains.
///
/// Path selection: a registered direct edge always wins; otherwise the
/// shortest path by edge count, with equal-length ties broken by
/// lexicographic order of the next hop's version string, so resolution is
/// deterministic across runs.
#[derive(Default)]
pub struct MigrationHelper {
    graph: DiGraph<String, MigrationScript>,
    versions: HashMap<String, NodeIndex>,
}

impl MigrationHelper {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, version: &str) -> NodeIndex {
        if let Some(&idx) = self.versions.get(version) {
            return idx;
        }
        let idx = self.graph.add_node(version.to_string());
        self.versions.insert(version.to_string(), idx);
        idx
    }

    /// Register a migration script for a version pair.
    ///
    /// Re-registering the same `(src, dst)` pair overwrites the prior script.
    pub fn add_version_migration(
        &mut self,
        src_ver: &str,
        dst_ver: &str,
        script: MigrationScript,
    ) {
        let src = self.node(src_ver);
        let dst = self.node(dst_ver);

        if let Some(edge) = self.graph.find_edge(src, dst) {
            debug!(src = %src_ver, dst = %dst_ver, "migration script overwritten");
            self.graph[edge] = script;
        } else {
            debug!(src = %src_ver, dst = %dst_ver, "migration script registered");
            self.graph.add_edge(src, dst, script);
        }
    }

    /// Migrate project data from `src_ver` to `dst_ver`.
    ///
    /// Identical versions are a no-op. Fails with `NoMigrationPath` when no
    /// chain connects the versions, or with `CircularRequirement` when the
    /// scripts reachable from `src_ver` only loop without ever reaching
    /// `dst_ver`.
    pub fn migration_from_version(
        &self,
        src_ver: &str,
        dst_ver: &str,
        project_data: Value,
    ) -> Result<Value> {
        if src_ver == dst_ver {
            return Ok(project_data);
        }

        let (src, dst) = match (self.versions.get(src_ver), self.versions.get(dst_ver)) {
            (Some(&src), Some(&dst)) => (src, dst),
            _ => return Err(Error::no_migration_path(src_ver, dst_ver)),
        };

        let path = self
            .find_path(src, dst)
            .ok_or_else(|| self.unreachable_error(src, src_ver, dst_ver))?;

        debug!(
            src = %src_ver,
            dst = %dst_ver,
            hops = path.len() - 1,
            "applying migration chain"
        );

        let mut data = project_data;
        for pair in path.windows(2) {
            // Edges on a found path always exist
            let edge = self
                .graph
                .find_edge(pair[0], pair[1])
                .ok_or_else(|| Error::no_migration_path(src_ver, dst_ver))?;
            data = (self.graph[edge])(data)?;
        }
        Ok(data)
    }

    /// BFS for the shortest chain, with a registered direct edge taking
    /// precedence over any multi-hop path.
    fn find_path(&self, src: NodeIndex, dst: NodeIndex) -> Option<Vec<NodeIndex>> {
        if self.graph.find_edge(src, dst).is_some() {
            return Some(vec![src, dst]);
        }

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(src);

        while let Some(current) = queue.pop_front() {
            let mut next: Vec<NodeIndex> = self.graph.neighbors(current).collect();
            // Deterministic tie-break among equal-length paths
            next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

            for neighbor in next {
                if neighbor == src || parent.contains_key(&neighbor) {
                    continue;
                }
                parent.insert(neighbor, current);
                if neighbor == dst {
                    let mut path = vec![dst];
                    let mut cursor = dst;
                    while cursor != src {
                        cursor = parent[&cursor];
                        path.push(cursor);
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }
        None
    }

    /// Distinguish "nothing registered toward dst" from "the reachable
    /// scripts only cycle": the latter is a circular-requirement condition.
    fn unreachable_error(&self, src: NodeIndex, src_ver: &str, dst_ver: &str) -> Error {
        if let Some(cycle) = self.reachable_cycle(src) {
            return Error::circular_requirement(cycle);
        }
        Error::no_migration_path(src_ver, dst_ver)
    }

    /// Find a cycle in the subgraph reachable from `start`, if any
    fn reachable_cycle(&self, start: NodeIndex) -> Option<Vec<String>> {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = Vec::new();
        self.cycle_dfs(start, &mut seen, &mut stack)
    }

    fn cycle_dfs(
        &self,
        current: NodeIndex,
        seen: &mut HashSet<NodeIndex>,
        stack: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = stack.iter().position(|&n| n == current) {
            let mut cycle: Vec<String> =
                stack[pos..].iter().map(|&n| self.graph[n].clone()).collect();
            cycle.push(self.graph[current].clone());
            return Some(cycle);
        }
        if !seen.insert(current) {
            return None;
        }

        stack.push(current);
        for edge in self.graph.edges(current) {
            if let Some(cycle) = self.cycle_dfs(edge.target(), seen, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bump(field: &str, value: i64) -> MigrationScript {
        let field = field.to_string();
        Box::new(move |mut data: Value| {
            data[&field] = json!(value);
            Ok(data)
        })
    }

    #[test]
    fn test_same_version_is_noop() {
        let helper = MigrationHelper::new();
        let data = json!({ "format": 1 });
        let out = helper
            .migration_from_version("1.0.0", "1.0.0", data.clone())
            .unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_single_edge_migration() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "2.0.0", bump("format", 2));

        let out = helper
            .migration_from_version("1.0.0", "2.0.0", json!({ "format": 1 }))
            .unwrap();
        assert_eq!(out, json!({ "format": 2 }));
    }

    #[test]
    fn test_chain_applies_scripts_in_sequence() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "1.1.0", Box::new(|mut data| {
            data["steps"] = json!([1]);
            Ok(data)
        }));
        helper.add_version_migration("1.1.0", "2.0.0", Box::new(|mut data| {
            let mut steps = data["steps"].as_array().cloned().unwrap_or_default();
            steps.push(json!(2));
            data["steps"] = json!(steps);
            Ok(data)
        }));

        let out = helper
            .migration_from_version("1.0.0", "2.0.0", json!({}))
            .unwrap();
        assert_eq!(out["steps"], json!([1, 2]));
    }

    #[test]
    fn test_direct_edge_preferred_over_chain() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "1.5.0", bump("via", 15));
        helper.add_version_migration("1.5.0", "2.0.0", bump("via", 20));
        helper.add_version_migration("1.0.0", "2.0.0", bump("via", 999));

        let out = helper
            .migration_from_version("1.0.0", "2.0.0", json!({}))
            .unwrap();
        assert_eq!(out["via"], json!(999));
    }

    #[test]
    fn test_reregistration_overwrites_script() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "2.0.0", bump("format", 2));
        helper.add_version_migration("1.0.0", "2.0.0", bump("format", 22));

        let out = helper
            .migration_from_version("1.0.0", "2.0.0", json!({}))
            .unwrap();
        assert_eq!(out["format"], json!(22));
    }

    #[test]
    fn test_equal_length_tie_broken_lexicographically() {
        // 1.0.0 -> {2.0.0-a, 2.0.0-b} -> 3.0.0; the "a" branch must win.
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "2.0.0-b", bump("branch", 2));
        helper.add_version_migration("1.0.0", "2.0.0-a", bump("branch", 1));
        helper.add_version_migration("2.0.0-b", "3.0.0", Box::new(|data| Ok(data)));
        helper.add_version_migration("2.0.0-a", "3.0.0", Box::new(|data| Ok(data)));

        let out = helper
            .migration_from_version("1.0.0", "3.0.0", json!({}))
            .unwrap();
        assert_eq!(out["branch"], json!(1));
    }

    #[test]
    fn test_no_path_is_reported() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "2.0.0", bump("format", 2));
        helper.add_version_migration("3.0.0", "4.0.0", bump("format", 4));

        let err = helper
            .migration_from_version("1.0.0", "4.0.0", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::NoMigrationPath { .. }));

        // Unknown versions are also a missing path
        let err = helper
            .migration_from_version("9.0.0", "2.0.0", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::NoMigrationPath { .. }));
    }

    #[test]
    fn test_unreachable_target_amid_cycle() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "1.1.0", bump("v", 11));
        helper.add_version_migration("1.1.0", "1.0.0", bump("v", 10));
        helper.add_version_migration("5.0.0", "6.0.0", bump("v", 60));

        let err = helper
            .migration_from_version("1.0.0", "6.0.0", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::CircularRequirement { .. }));
    }

    #[test]
    fn test_script_failure_propagates() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration(
            "1.0.0",
            "2.0.0",
            Box::new(|_| Err(Error::invalid_version("corrupt"))),
        );

        let err = helper
            .migration_from_version("1.0.0", "2.0.0", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidVersion { .. }));
    }

    #[test]
    fn test_migrate_change_block_rewrites_across_targets() {
        let mut targets = json!([
            { "name": "stage", "blocks": {
                "b1": { "opcode": "gfx.draw", "next": null },
                "b2": { "opcode": "gfx.clear" }
            }},
            { "name": "sprite", "blocks": {
                "b3": { "opcode": "gfx.draw" }
            }}
        ]);

        let changed = migrate_change_block(&mut targets, "gfx.draw", "gfx.render");

        assert_eq!(changed, 2);
        assert_eq!(targets[0]["blocks"]["b1"]["opcode"], json!("gfx.render"));
        assert_eq!(targets[0]["blocks"]["b2"]["opcode"], json!("gfx.clear"));
        assert_eq!(targets[1]["blocks"]["b3"]["opcode"], json!("gfx.render"));
    }

    #[test]
    fn test_migrate_change_block_accepts_map_and_rejects_scalars() {
        let mut map_targets = json!({
            "stage": { "blocks": { "b1": { "opcode": "old" } } },
            "empty": {}
        });
        assert_eq!(migrate_change_block(&mut map_targets, "old", "new"), 1);
        assert_eq!(map_targets["stage"]["blocks"]["b1"]["opcode"], json!("new"));

        let mut not_targets = json!("nope");
        assert_eq!(migrate_change_block(&mut not_targets, "old", "new"), 0);
    }

    #[test]
    fn test_round_trip_with_inverse_scripts() {
        let mut helper = MigrationHelper::new();
        helper.add_version_migration("1.0.0", "2.0.0", Box::new(|mut data| {
            let old = data["count"].as_i64().unwrap_or(0);
            data["count"] = json!(old * 10);
            Ok(data)
        }));
        helper.add_version_migration("2.0.0", "1.0.0", Box::new(|mut data| {
            let new = data["count"].as_i64().unwrap_or(0);
            data["count"] = json!(new / 10);
            Ok(data)
        }));

        let original = json!({ "count": 7 });
        let forward = helper
            .migration_from_version("1.0.0", "2.0.0", original.clone())
            .unwrap();
        assert_eq!(forward["count"], json!(70));

        let back = helper
            .migration_from_version("2.0.0", "1.0.0", forward)
            .unwrap();
        assert_eq!(back, original);
    }
}
