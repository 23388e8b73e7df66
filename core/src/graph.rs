//! # Device Graph Builder
//!
//! Links every logical device to the entities it is built on and computes
//! the order in which they can be created.
//!
//! The graph is an adjacency list over entity table positions. Edges point
//! from a device to its dependencies:
//! * a bond depends on each of its member interfaces,
//! * a vlan depends on the interface or device it is stacked on.
//!
//! Traversals are iterative and touch each entity a bounded number of times,
//! so a malformed document cannot make them loop.

use std::collections::{BTreeSet, HashMap};

use bootnet_common::error::{CompileError, Result};
use tracing::debug;

use crate::model::{EntityKind, EntityTable};

/// Lowest and highest usable 802.1Q tag. 0 and 4095 are reserved.
pub const VLAN_ID_MIN: i64 = 1;
pub const VLAN_ID_MAX: i64 = 4094;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug)]
pub struct DeviceGraph {
    /// `deps[i]` lists what entity `i` is built on, in declaration order.
    deps: Vec<Vec<usize>>,
    /// `dependents[i]` lists the devices built on entity `i`.
    dependents: Vec<Vec<usize>>,
    /// Member interface -> owning bond.
    bond_of: HashMap<usize, usize>,
    order: Vec<usize>,
}

impl DeviceGraph {
    /// Validates every reference between entities and computes the creation order.
    pub fn build(table: &EntityTable) -> Result<Self> {
        let count = table.len();
        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut bond_of: HashMap<usize, usize> = HashMap::new();

        for (idx, entity) in table.iter().enumerate() {
            match &entity.kind {
                EntityKind::Interface => {}
                EntityKind::Bond(bond) => {
                    for member in &bond.interfaces {
                        let target = table.index_of(member).ok_or_else(|| {
                            CompileError::reference(&*entity.name, &**member, "no such interface")
                        })?;
                        if table.get(target).is_device() {
                            return Err(CompileError::reference(
                                &*entity.name,
                                &**member,
                                format!(
                                    "bond members must be interfaces, not a {}",
                                    table.get(target).kind_name()
                                ),
                            ));
                        }
                        if deps[idx].contains(&target) {
                            return Err(CompileError::conflict(format!(
                                "'{member}' is listed more than once in bond '{}'",
                                entity.name
                            )));
                        }
                        if let Some(&owner) = bond_of.get(&target) {
                            return Err(CompileError::conflict(format!(
                                "'{member}' is claimed by both bond '{}' and bond '{}'",
                                table.get(owner).name,
                                entity.name
                            )));
                        }
                        bond_of.insert(target, idx);
                        deps[idx].push(target);
                    }
                }
                EntityKind::Vlan(vlan) => {
                    if !(VLAN_ID_MIN..=VLAN_ID_MAX).contains(&vlan.id) {
                        return Err(CompileError::range(
                            format!("{}.id", entity.name),
                            format!("{} is not between {VLAN_ID_MIN} and {VLAN_ID_MAX}", vlan.id),
                        ));
                    }
                    let target = table.index_of(&vlan.device).ok_or_else(|| {
                        CompileError::reference(&*entity.name, &*vlan.device, "no such interface or device")
                    })?;
                    deps[idx].push(target);
                }
            }
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (idx, targets) in deps.iter().enumerate() {
            for &target in targets {
                dependents[target].push(idx);
            }
        }

        let graph = Self {
            deps,
            dependents,
            bond_of,
            order: Vec::new(),
        };
        graph.check_cycles(table)?;
        graph.check_stacking(table)?;

        let order = graph.stable_topological_order(table);
        debug!(
            "Built device graph: {} entities, {} dependency edges",
            count,
            graph.deps.iter().map(Vec::len).sum::<usize>()
        );
        Ok(Self { order, ..graph })
    }

    /// Positions in creation order: every entity appears after everything it depends on.
    pub fn creation_order(&self) -> &[usize] {
        &self.order
    }

    pub fn dependencies(&self, idx: usize) -> &[usize] {
        &self.deps[idx]
    }

    /// True when some device is built on top of this entity.
    pub fn has_dependents(&self, idx: usize) -> bool {
        !self.dependents[idx].is_empty()
    }

    /// The bond that owns this interface, if any.
    pub fn bond_of(&self, idx: usize) -> Option<usize> {
        self.bond_of.get(&idx).copied()
    }

    /// Depth-first search with in-progress marking. Reports the first cycle
    /// found, starting from the earliest entity in file order.
    fn check_cycles(&self, table: &EntityTable) -> Result<()> {
        let mut marks = vec![Mark::Unvisited; self.deps.len()];

        for root in 0..self.deps.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // (node, next dependency to visit)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::InProgress;

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if let Some(&dep) = self.deps[node].get(frame.1) {
                    frame.1 += 1;
                    match marks[dep] {
                        Mark::Unvisited => {
                            marks[dep] = Mark::InProgress;
                            stack.push((dep, 0));
                        }
                        Mark::InProgress => {
                            let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                            let mut path: Vec<String> = stack[start..]
                                .iter()
                                .map(|&(n, _)| table.get(n).name.to_string())
                                .collect();
                            path.push(table.get(dep).name.to_string());
                            return Err(CompileError::Cycle { path });
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Rules on what may be stacked on what, beyond plain existence.
    fn check_stacking(&self, table: &EntityTable) -> Result<()> {
        let mut tags: HashMap<(usize, i64), usize> = HashMap::new();

        for (idx, entity) in table.iter().enumerate() {
            let EntityKind::Vlan(vlan) = &entity.kind else {
                continue;
            };
            let parent = self.deps[idx][0];

            if let Some(bond) = self.bond_of(parent) {
                return Err(CompileError::conflict(format!(
                    "vlan '{}' is stacked on '{}', which is a member of bond '{}'",
                    entity.name,
                    vlan.device,
                    table.get(bond).name
                )));
            }
            if let Some(&other) = tags.get(&(parent, vlan.id)) {
                return Err(CompileError::conflict(format!(
                    "vlans '{}' and '{}' both use id {} on '{}'",
                    table.get(other).name,
                    entity.name,
                    vlan.id,
                    vlan.device
                )));
            }
            tags.insert((parent, vlan.id), idx);
        }
        Ok(())
    }

    /// Interfaces first in file order, then devices. Among devices whose
    /// dependencies are all satisfied, the earliest in the file goes next.
    fn stable_topological_order(&self, table: &EntityTable) -> Vec<usize> {
        let count = self.deps.len();
        let mut order: Vec<usize> = (0..count).filter(|&i| !table.get(i).is_device()).collect();

        let mut pending: Vec<usize> = (0..count)
            .map(|i| {
                self.deps[i]
                    .iter()
                    .filter(|&&d| table.get(d).is_device())
                    .count()
            })
            .collect();
        let mut ready: BTreeSet<usize> = (0..count)
            .filter(|&i| table.get(i).is_device() && pending[i] == 0)
            .collect();

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &self.dependents[next] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }
        order
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use bootnet_common::ErrorKind;
    use bootnet_common::document::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn build(doc: serde_json::Value) -> Result<(EntityTable, DeviceGraph)> {
        let doc = Value::from(doc);
        let version = crate::schema::resolve(&doc)?;
        let table = crate::extract::extract(&doc, version)?;
        let graph = DeviceGraph::build(&table)?;
        Ok((table, graph))
    }

    fn order_names(doc: serde_json::Value) -> Vec<String> {
        let (table, graph) = build(doc).unwrap();
        graph
            .creation_order()
            .iter()
            .map(|&i| table.get(i).name.to_string())
            .collect()
    }

    fn bond(members: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "bond",
            "interfaces": members,
            "parameters": { "mode": "active-backup", "miimon": { "frequency": 100, "updelay": 0, "downdelay": 0 } }
        })
    }

    #[test]
    fn interfaces_keep_file_order() {
        assert_eq!(
            order_names(json!({ "version": 2, "eno3": {}, "eno1": {}, "eno2": {} })),
            vec!["eno3", "eno1", "eno2"]
        );
    }

    #[test]
    fn dependencies_override_file_order() {
        let order = order_names(json!({
            "version": 3,
            "device": {
                "vlan10": { "type": "vlan", "device": "bond0", "id": 10 },
                "vlan20": { "type": "vlan", "device": "eno3", "id": 20 },
                "bond0": bond(json!(["eno1", "eno2"]))
            },
            "eno1": {},
            "eno2": {},
            "eno3": {}
        }));
        assert_eq!(order, vec!["eno1", "eno2", "eno3", "vlan20", "bond0", "vlan10"]);
    }

    #[test]
    fn vlans_can_stack_on_vlans() {
        let order = order_names(json!({
            "version": 3,
            "eno1": {},
            "device": {
                "inner": { "type": "vlan", "device": "outer", "id": 200 },
                "outer": { "type": "vlan", "device": "eno1", "id": 100 }
            }
        }));
        assert_eq!(order, vec!["eno1", "outer", "inner"]);
    }

    #[test]
    fn missing_references_are_reported() {
        let err = build(json!({
            "version": 3,
            "eno1": {},
            "device": { "bond0": bond(json!(["eno1", "eno9"])) }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);

        let err = build(json!({
            "version": 3,
            "device": { "vlan5": { "type": "vlan", "device": "eno1", "id": 5 } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn bond_members_must_be_interfaces() {
        let err = build(json!({
            "version": 3,
            "eno1": {},
            "device": {
                "vlan5": { "type": "vlan", "device": "eno1", "id": 5 },
                "bond0": bond(json!(["vlan5"]))
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn interface_in_two_bonds_conflicts() {
        let err = build(json!({
            "version": 3,
            "eno1": {},
            "eno2": {},
            "device": {
                "bond0": bond(json!(["eno1", "eno2"])),
                "bond1": bond(json!(["eno2"]))
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn vlan_on_bond_member_conflicts() {
        let err = build(json!({
            "version": 3,
            "eno1": {},
            "device": {
                "bond0": bond(json!(["eno1"])),
                "vlan5": { "type": "vlan", "device": "eno1", "id": 5 }
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn repeated_vlan_tag_on_one_parent_conflicts() {
        let err = build(json!({
            "version": 3,
            "eno1": {},
            "device": {
                "vlan5": { "type": "vlan", "device": "eno1", "id": 5 },
                "voice": { "type": "vlan", "device": "eno1", "id": 5 }
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn cycles_are_reported_with_their_path() {
        let err = build(json!({
            "version": 3,
            "device": {
                "vlan1": { "type": "vlan", "device": "vlan2", "id": 1 },
                "vlan2": { "type": "vlan", "device": "vlan3", "id": 2 },
                "vlan3": { "type": "vlan", "device": "vlan1", "id": 3 }
            }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::Cycle {
                path: vec!["vlan1".into(), "vlan2".into(), "vlan3".into(), "vlan1".into()]
            }
        );

        let err = build(json!({
            "version": 3,
            "device": { "loop0": { "type": "vlan", "device": "loop0", "id": 7 } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);
    }

    #[test]
    fn vlan_id_bounds() {
        for id in [0, 4095, 4096, -3] {
            let err = build(json!({
                "version": 3,
                "eno1": {},
                "device": { "vlan": { "type": "vlan", "device": "eno1", "id": id } }
            }))
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Range, "id {id} accepted");
        }
        for id in [1, 4094] {
            assert!(build(json!({
                "version": 3,
                "eno1": {},
                "device": { "vlan": { "type": "vlan", "device": "eno1", "id": id } }
            }))
            .is_ok());
        }
    }

    #[test]
    fn bond_ownership_is_tracked() {
        let (table, graph) = build(json!({
            "version": 3,
            "eno1": {},
            "eno2": {},
            "eno3": {},
            "device": { "bond0": bond(json!(["eno2", "eno1"])) }
        }))
        .unwrap();
        let bond0 = table.index_of("bond0").unwrap();
        assert_eq!(graph.bond_of(0), Some(bond0));
        assert_eq!(graph.bond_of(2), None);
        assert_eq!(graph.dependencies(bond0), &[1, 0]);
        assert!(graph.has_dependents(0));
        assert!(!graph.has_dependents(bond0));
    }
}
