//! # Primary Resolver
//!
//! Picks the single entity whose address identifies the host.

use bootnet_common::error::{CompileError, Result};
use tracing::debug;

use crate::graph::DeviceGraph;
use crate::model::EntityTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primary {
    /// Position of the primary entity in the entity table.
    pub index: usize,
    /// Whether the document marked it with `primary = true`.
    pub explicit: bool,
}

/// At most one entity may carry `primary = true`. Without one, the first
/// entity in file order that nothing else is built on wins.
pub fn resolve(table: &EntityTable, graph: &DeviceGraph) -> Result<Primary> {
    let mut marked = (0..table.len()).filter(|&i| table.get(i).primary);

    if let Some(first) = marked.next() {
        if let Some(second) = marked.next() {
            return Err(CompileError::AmbiguousPrimary {
                first: table.get(first).name.to_string(),
                second: table.get(second).name.to_string(),
            });
        }
        if let Some(bond) = graph.bond_of(first) {
            return Err(CompileError::conflict(format!(
                "'{}' is marked primary but is a member of bond '{}'",
                table.get(first).name,
                table.get(bond).name
            )));
        }
        debug!("Primary entity '{}' selected explicitly", table.get(first).name);
        return Ok(Primary {
            index: first,
            explicit: true,
        });
    }

    // The graph is acyclic by now, so some entity always has no dependents.
    let index = (0..table.len())
        .find(|&i| !graph.has_dependents(i))
        .ok_or_else(|| CompileError::schema("document declares no interfaces or devices"))?;
    debug!("Primary entity '{}' selected by file order", table.get(index).name);
    Ok(Primary {
        index,
        explicit: false,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
