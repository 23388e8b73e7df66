//! # Plan Emitter
//!
//! Assembles the validated model into the [`ResolvedPlan`] handed to the
//! network manager. Pure: the same model always yields the same plan.
//!
//! Entries are listed in creation order. A consumer may bring entries up in
//! parallel as long as each entry starts only after the entries named in its
//! `depends-on` list.

use std::net::IpAddr;

use bootnet_common::EntityName;
use serde::Serialize;
use tracing::info;

use crate::addressing::{DhcpConfig, ResolvedAddressing, Route, RouteDestination, RouteScope};
use crate::bond::BondParameters;
use crate::graph::DeviceGraph;
use crate::model::EntityTable;
use crate::primary::Primary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    pub primary: EntityName,
    /// Statically known address of the primary entity, IPv4 preferred.
    /// `None` when the primary is addressed dynamically or not at all.
    #[serde(rename = "primary-address")]
    pub primary_address: Option<IpAddr>,
    pub entries: Vec<PlanEntry>,
}

impl ResolvedPlan {
    pub fn entry(&self, name: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanEntry {
    pub name: EntityName,
    pub primary: bool,
    pub action: Action,
    pub depends_on: Vec<EntityName>,
    pub addressing: AddressingPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// Configure an existing physical interface.
    Interface,
    /// Create a bond over `members`; the first member is the bond's primary.
    Bond {
        members: Vec<EntityName>,
        parameters: BondParameters,
    },
    /// Create a tagged vlan on top of `device`.
    Vlan { device: EntityName, id: u16 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressingPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp4: Option<DhcpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp6: Option<DhcpConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static4: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static6: Vec<String>,
    /// Ranked by ascending metric, unranked routes last.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RoutePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutePlan {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_metric: Option<u32>,
    pub scope: RouteScope,
}

impl From<&Route> for RoutePlan {
    fn from(route: &Route) -> Self {
        let to = match route.to {
            RouteDestination::Default => crate::addressing::DEFAULT_ROUTE.to_string(),
            RouteDestination::Network(net) => net.to_string(),
        };
        Self {
            to,
            from: route.from,
            via: route.via,
            route_metric: route.metric,
            scope: route.scope(),
        }
    }
}

impl From<&ResolvedAddressing> for AddressingPlan {
    fn from(resolved: &ResolvedAddressing) -> Self {
        Self {
            dhcp4: resolved.dhcp4,
            dhcp6: resolved.dhcp6,
            static4: resolved.static4.iter().map(ToString::to_string).collect(),
            static6: resolved.static6.iter().map(ToString::to_string).collect(),
            routes: resolved.ordered_routes().into_iter().map(RoutePlan::from).collect(),
        }
    }
}

/// Everything the emitter needs, indexed by entity table position.
pub struct ValidatedModel<'a> {
    pub table: &'a EntityTable,
    pub graph: &'a DeviceGraph,
    pub primary: Primary,
    pub addressing: Vec<ResolvedAddressing>,
    pub actions: Vec<Action>,
}

/// Walks the creation order and emits one entry per entity.
pub fn emit(model: &ValidatedModel<'_>) -> ResolvedPlan {
    let ValidatedModel {
        table,
        graph,
        primary,
        addressing,
        actions,
    } = model;

    let entries: Vec<PlanEntry> = graph
        .creation_order()
        .iter()
        .map(|&idx| PlanEntry {
            name: table.get(idx).name.clone(),
            primary: idx == primary.index,
            action: actions[idx].clone(),
            depends_on: graph
                .dependencies(idx)
                .iter()
                .map(|&d| table.get(d).name.clone())
                .collect(),
            addressing: AddressingPlan::from(&addressing[idx]),
        })
        .collect();

    let plan = ResolvedPlan {
        primary: table.get(primary.index).name.clone(),
        primary_address: addressing[primary.index].primary_address(),
        entries,
    };
    info!(
        "Emitted network plan with {} entries, primary '{}' ({})",
        plan.entries.len(),
        plan.primary,
        if primary.explicit { "marked" } else { "first in file order" }
    );
    plan
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
