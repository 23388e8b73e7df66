//! # Addressing & Route Resolver
//!
//! Turns an entity's raw address blocks and routes into validated values,
//! enforcing that DHCP and static configuration never meet on the same
//! address family.

use std::net::IpAddr;
use std::str::FromStr;

use bootnet_common::error::{CompileError, Result};
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::Serialize;

use crate::graph::DeviceGraph;
use crate::model::{DhcpBlock, Entity, EntityTable, RouteBlock};

/// Literal accepted in a route's `to` field in place of a CIDR.
pub const DEFAULT_ROUTE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DhcpConfig {
    pub enabled: bool,
    #[serde(rename = "route-metric", skip_serializing_if = "Option::is_none")]
    pub route_metric: Option<u32>,
    /// Recorded only. Lease acquisition belongs to the network manager.
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDestination {
    Default,
    Network(IpNetwork),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteScope {
    /// No gateway: the destination is directly reachable on the link.
    Link,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub to: RouteDestination,
    pub from: Option<IpAddr>,
    pub via: Option<IpAddr>,
    pub metric: Option<u32>,
}

impl Route {
    pub fn scope(&self) -> RouteScope {
        match self.via {
            Some(_) => RouteScope::Global,
            None => RouteScope::Link,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddressing {
    pub dhcp4: Option<DhcpConfig>,
    pub dhcp6: Option<DhcpConfig>,
    pub static4: Vec<Ipv4Network>,
    pub static6: Vec<Ipv6Network>,
    /// File order, exactly as declared.
    pub routes: Vec<Route>,
}

impl ResolvedAddressing {
    /// Routes ranked by ascending metric, routes without a metric last.
    /// Equal metrics keep their file order.
    pub fn ordered_routes(&self) -> Vec<&Route> {
        let mut ordered: Vec<&Route> = self.routes.iter().collect();
        ordered.sort_by_key(|route| route.metric.map_or((1, 0), |m| (0, m)));
        ordered
    }

    /// Every statically known address, IPv4 first.
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.static4
            .iter()
            .map(|net| IpAddr::V4(net.ip()))
            .chain(self.static6.iter().map(|net| IpAddr::V6(net.ip())))
            .collect()
    }

    /// The address other components should identify this entity by.
    /// Only static addresses are known ahead of time.
    pub fn primary_address(&self) -> Option<IpAddr> {
        self.addresses().into_iter().next()
    }
}

/// Resolves addressing for the entity at `idx`.
pub fn resolve(table: &EntityTable, graph: &DeviceGraph, idx: usize) -> Result<ResolvedAddressing> {
    let entity = table.get(idx);
    let name = entity.name.as_str();

    if let Some(bond) = graph.bond_of(idx)
        && (!entity.addressing.is_empty() || !entity.routes.is_empty())
    {
        return Err(CompileError::conflict(format!(
            "'{name}' is a member of bond '{}' and cannot be addressed on its own",
            table.get(bond).name
        )));
    }

    let blocks = &entity.addressing;
    if blocks.dhcp4.is_some() && blocks.static4.is_some() {
        return Err(CompileError::conflict(format!(
            "'{name}' has both dhcp4 and static4 configuration"
        )));
    }
    if blocks.dhcp6.is_some() && blocks.static6.is_some() {
        return Err(CompileError::conflict(format!(
            "'{name}' has both dhcp6 and static6 configuration"
        )));
    }

    let static4 = match &blocks.static4 {
        Some(block) => parse_addresses(&format!("{name}.static4"), &block.addresses)?,
        None => Vec::new(),
    };
    let static6 = match &blocks.static6 {
        Some(block) => parse_addresses(&format!("{name}.static6"), &block.addresses)?,
        None => Vec::new(),
    };

    Ok(ResolvedAddressing {
        dhcp4: blocks.dhcp4.as_ref().map(|b| resolve_dhcp(name, "dhcp4", b)).transpose()?,
        dhcp6: blocks.dhcp6.as_ref().map(|b| resolve_dhcp(name, "dhcp6", b)).transpose()?,
        static4,
        static6,
        routes: resolve_routes(entity)?,
    })
}

fn resolve_dhcp(name: &str, family: &str, block: &DhcpBlock) -> Result<DhcpConfig> {
    Ok(DhcpConfig {
        enabled: block.enabled,
        route_metric: block
            .route_metric
            .map(|m| parse_metric(&format!("{name}.{family}.route-metric"), m))
            .transpose()?,
        optional: block.optional,
    })
}

fn resolve_routes(entity: &Entity) -> Result<Vec<Route>> {
    let ctx = format!("{}.route", entity.name);
    entity.routes.iter().map(|block| parse_route(&ctx, block)).collect()
}

fn parse_route(ctx: &str, block: &RouteBlock) -> Result<Route> {
    let to = if block.to == DEFAULT_ROUTE {
        RouteDestination::Default
    } else {
        RouteDestination::Network(parse_cidr(&format!("{ctx}.to"), &block.to)?)
    };
    let via = block
        .via
        .as_deref()
        .map(|s| parse_ip(&format!("{ctx}.via"), s))
        .transpose()?;
    let from = block
        .from
        .as_deref()
        .map(|s| parse_ip(&format!("{ctx}.from"), s))
        .transpose()?;
    let metric = block
        .route_metric
        .map(|m| parse_metric(&format!("{ctx}.route-metric"), m))
        .transpose()?;

    let destination_family = match to {
        RouteDestination::Network(net) => Some(net.is_ipv4()),
        RouteDestination::Default => None,
    };
    let families = [destination_family, via.map(|ip| ip.is_ipv4()), from.map(|ip| ip.is_ipv4())];
    let mut known = families.iter().flatten();
    if let Some(first) = known.next()
        && known.any(|family| family != first)
    {
        return Err(CompileError::conflict(format!(
            "'{ctx}' to '{}' mixes IPv4 and IPv6 addresses",
            block.to
        )));
    }

    Ok(Route { to, from, via, metric })
}

/// Static addresses, route destinations and ARP targets must spell out their prefix.
pub(crate) fn parse_cidr<N: FromStr>(ctx: &str, input: &str) -> Result<N>
where
    N::Err: std::fmt::Display,
{
    if !input.contains('/') {
        return Err(CompileError::schema(format!(
            "'{ctx}': '{input}' must be in CIDR notation (address/prefix)"
        )));
    }
    input
        .parse::<N>()
        .map_err(|e| CompileError::schema(format!("'{ctx}': invalid CIDR '{input}': {e}")))
}

fn parse_addresses<N: FromStr>(ctx: &str, inputs: &[String]) -> Result<Vec<N>>
where
    N::Err: std::fmt::Display,
{
    inputs.iter().map(|input| parse_cidr(ctx, input)).collect()
}

fn parse_ip(ctx: &str, input: &str) -> Result<IpAddr> {
    input
        .parse::<IpAddr>()
        .map_err(|e| CompileError::schema(format!("'{ctx}': invalid IP address '{input}': {e}")))
}

fn parse_metric(ctx: &str, metric: i64) -> Result<u32> {
    u32::try_from(metric).map_err(|_| {
        CompileError::range(ctx, format!("{metric} is not between 0 and {}", u32::MAX))
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
