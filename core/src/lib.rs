//! # Bootnet Compiler
//!
//! Compiles a declarative network document into an ordered, conflict-free
//! plan of interfaces, bonds and vlans.
//!
//! ## Stages
//! Data flows strictly through these stages; the first error halts the run
//! and no plan is produced.
//!
//! * **[`schema`]**: resolves the document version and its feature set.
//! * **[`extract`]**: walks the document into typed entities, in file order.
//! * **[`graph`]**: links devices to what they are built on, orders creation.
//! * **[`primary`]**: selects the single primary entity.
//! * **[`addressing`]**: DHCP/static resolution and route ranking.
//! * **[`bond`]**: validates bond mode and link monitoring.
//! * **[`plan`]**: emits the final [`ResolvedPlan`].

pub mod addressing;
pub mod bond;
pub mod extract;
pub mod graph;
pub mod model;
pub mod plan;
pub mod primary;
pub mod schema;

use bootnet_common::document::Value;
use bootnet_common::error::{CompileError, Result};
use tracing::debug;

use graph::DeviceGraph;
use model::{Entity, EntityKind};
use plan::{Action, ValidatedModel};

pub use plan::ResolvedPlan;

/// Runs every stage over `doc` and returns the plan.
pub fn compile(doc: &Value) -> Result<ResolvedPlan> {
    let version = schema::resolve(doc)?;
    let table = extract::extract(doc, version)?;
    let graph = DeviceGraph::build(&table)?;
    let primary = primary::resolve(&table, &graph)?;

    let addressing = (0..table.len())
        .map(|idx| addressing::resolve(&table, &graph, idx))
        .collect::<Result<Vec<_>>>()?;
    debug!("Resolved addressing for {} entities", addressing.len());

    let actions = table.iter().map(compile_action).collect::<Result<Vec<_>>>()?;

    Ok(plan::emit(&ValidatedModel {
        table: &table,
        graph: &graph,
        primary,
        addressing,
        actions,
    }))
}

fn compile_action(entity: &Entity) -> Result<Action> {
    match &entity.kind {
        EntityKind::Interface => Ok(Action::Interface),
        EntityKind::Bond(device) => Ok(Action::Bond {
            members: device.interfaces.clone(),
            parameters: bond::compile(&entity.name, device)?,
        }),
        EntityKind::Vlan(vlan) => Ok(Action::Vlan {
            device: vlan.device.clone(),
            id: u16::try_from(vlan.id).map_err(|_| {
                CompileError::range(format!("{}.id", entity.name), vlan.id.to_string())
            })?,
        }),
    }
}
