//! # Entity Model
//!
//! Typed records produced by the extractor. Nothing in here is modified
//! after extraction: later stages read these records and build their own
//! resolved outputs next to them.
//!
//! Scalar values that a later stage is responsible for validating (CIDRs,
//! metrics, bond timings, the vlan tag) are kept exactly as written so that
//! each rule is enforced in one place.

use std::collections::HashMap;

use bootnet_common::EntityName;
use bootnet_common::error::{CompileError, Result};

/// Canonical form of a `dhcp4`/`dhcp6` block, whether it was written as a
/// bare boolean or as a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpBlock {
    pub enabled: bool,
    /// Only ever set for DHCPv4.
    pub route_metric: Option<i64>,
    /// A missing lease must not hold back the entity's readiness.
    pub optional: bool,
}

impl DhcpBlock {
    /// `dhcp4 = true` is shorthand for `{ enabled = true }`.
    pub fn shorthand(enabled: bool) -> Self {
        Self {
            enabled,
            route_metric: None,
            optional: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBlock {
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBlock {
    pub to: String,
    pub from: Option<String>,
    pub via: Option<String>,
    pub route_metric: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBlocks {
    pub dhcp4: Option<DhcpBlock>,
    pub dhcp6: Option<DhcpBlock>,
    pub static4: Option<StaticBlock>,
    pub static6: Option<StaticBlock>,
}

impl AddressBlocks {
    pub fn is_empty(&self) -> bool {
        self.dhcp4.is_none() && self.dhcp6.is_none() && self.static4.is_none() && self.static6.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiimonBlock {
    pub frequency: i64,
    pub updelay: i64,
    pub downdelay: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpmonBlock {
    pub interval: i64,
    pub validate: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondParameterBlock {
    pub mode: String,
    pub min_links: Option<i64>,
    pub miimon: Option<MiimonBlock>,
    pub arpmon: Option<ArpmonBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondDevice {
    /// Member interfaces in declaration order; the first one is the bond's own primary.
    pub interfaces: Vec<EntityName>,
    pub parameters: BondParameterBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanDevice {
    pub device: EntityName,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A physical interface. Referenced by the plan, never created by it.
    Interface,
    Bond(BondDevice),
    Vlan(VlanDevice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: EntityName,
    pub primary: bool,
    pub addressing: AddressBlocks,
    /// Routes in file order. Metric ranking is applied on output only.
    pub routes: Vec<RouteBlock>,
    pub kind: EntityKind,
}

impl Entity {
    pub fn is_device(&self) -> bool {
        !matches!(self.kind, EntityKind::Interface)
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Interface => "interface",
            EntityKind::Bond(_) => "bond",
            EntityKind::Vlan(_) => "vlan",
        }
    }
}

/// Entities in file order with a name index on the side.
///
/// Position in the table is the entity's file order and doubles as its
/// identifier in every later stage.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: Vec<Entity>,
    index: HashMap<EntityName, usize>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entity. A name that is already taken is always an error,
    /// never an override.
    pub fn insert(&mut self, entity: Entity) -> Result<usize> {
        if let Some(&existing) = self.index.get(&entity.name) {
            return Err(CompileError::schema(format!(
                "'{}' is declared more than once (first as {}, again as {})",
                entity.name,
                self.entities[existing].kind_name(),
                entity.kind_name()
            )));
        }
        let idx = self.entities.len();
        self.index.insert(entity.name.clone(), idx);
        self.entities.push(entity);
        Ok(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, idx: usize) -> &Entity {
        &self.entities[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
