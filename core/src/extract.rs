//! # Entity Extractor
//!
//! Walks the document tree into typed [`Entity`] records in file order.
//!
//! This stage owns the *shape* of the document: which keys are legal for
//! the resolved schema version, which are required, and what type each
//! value has. Semantic checks (address syntax, ranges, references) happen
//! in the stages that consume these records.

use bootnet_common::EntityName;
use bootnet_common::document::Value;
use bootnet_common::error::{CompileError, Result};
use tracing::debug;

use crate::model::{
    AddressBlocks, ArpmonBlock, BondDevice, BondParameterBlock, DhcpBlock, Entity, EntityKind,
    EntityTable, MiimonBlock, RouteBlock, StaticBlock, VlanDevice,
};
use crate::schema::{DEVICE_ONLY_KEYS, DEVICE_SECTION, FeatureSet, SchemaVersion, VERSION_KEY};

/// `route` may appear any number of times; every other key at most once.
const REPEATABLE_KEYS: &[&str] = &["route"];

const DHCP4_KEYS: &[&str] = &["enabled", "route-metric", "optional"];
const DHCP6_KEYS: &[&str] = &["enabled", "optional"];
const STATIC_KEYS: &[&str] = &["addresses"];
const ROUTE_KEYS: &[&str] = &["to", "from", "via", "route-metric"];
const BOND_PARAMETER_KEYS: &[&str] = &["mode", "min-links", "miimon", "arpmon"];
const MIIMON_KEYS: &[&str] = &["frequency", "updelay", "downdelay"];
const ARPMON_KEYS: &[&str] = &["interval", "validate", "targets"];

type Entries = [(String, Value)];

/// Extracts every interface and device declared in `doc`.
pub fn extract(doc: &Value, version: SchemaVersion) -> Result<EntityTable> {
    let features = version.features();
    let entries = expect_map("document", doc)?;
    let mut table = EntityTable::new();
    let mut seen_devices = false;

    for (key, value) in entries {
        match key.as_str() {
            VERSION_KEY => {}
            DEVICE_SECTION => {
                if !features.devices {
                    return Err(CompileError::schema(format!(
                        "bond and vlan devices require version 3, document is version {}",
                        version.number()
                    )));
                }
                if seen_devices {
                    return Err(CompileError::schema(format!(
                        "'{DEVICE_SECTION}' section is given more than once"
                    )));
                }
                seen_devices = true;
                for (name, block) in expect_map(DEVICE_SECTION, value)? {
                    table.insert(extract_device(name, block, features)?)?;
                }
            }
            name => {
                table.insert(extract_interface(name, value, features)?)?;
            }
        }
    }

    debug!(
        "Extracted {} entities ({} devices)",
        table.len(),
        table.iter().filter(|e| e.is_device()).count()
    );
    Ok(table)
}

fn extract_interface(name: &str, block: &Value, features: &FeatureSet) -> Result<Entity> {
    let name = EntityName::try_from(name)?;
    let entries = expect_map(&name, block)?;

    if features.devices
        && let Some((key, _)) = entries.iter().find(|(k, _)| DEVICE_ONLY_KEYS.contains(&k.as_str()))
    {
        return Err(CompileError::schema(format!(
            "'{name}' uses device key '{key}' at top level; devices must be declared under '{DEVICE_SECTION}.{name}'"
        )));
    }
    check_keys(&name, entries, features.interface_keys)?;

    let (primary, addressing, routes) = extract_common(&name, entries)?;
    Ok(Entity {
        name,
        primary,
        addressing,
        routes,
        kind: EntityKind::Interface,
    })
}

fn extract_device(name: &str, block: &Value, features: &FeatureSet) -> Result<Entity> {
    let name = EntityName::try_from(name)?;
    let entries = expect_map(&name, block)?;

    let kind = match required_str(&name, entries, "type")? {
        "bond" => {
            check_keys(&name, entries, features.bond_keys)?;
            EntityKind::Bond(extract_bond(&name, entries)?)
        }
        "vlan" => {
            check_keys(&name, entries, features.vlan_keys)?;
            EntityKind::Vlan(extract_vlan(&name, entries)?)
        }
        other => {
            return Err(CompileError::schema(format!(
                "'{name}': unknown device type '{other}', expected 'bond' or 'vlan'"
            )));
        }
    };

    let (primary, addressing, routes) = extract_common(&name, entries)?;
    Ok(Entity {
        name,
        primary,
        addressing,
        routes,
        kind,
    })
}

fn extract_common(ctx: &str, entries: &Entries) -> Result<(bool, AddressBlocks, Vec<RouteBlock>)> {
    let primary = match lookup(entries, "primary") {
        Some(v) => as_bool(ctx, "primary", v)?,
        None => false,
    };

    let addressing = AddressBlocks {
        dhcp4: lookup(entries, "dhcp4")
            .map(|v| extract_dhcp(&format!("{ctx}.dhcp4"), v, DHCP4_KEYS))
            .transpose()?,
        dhcp6: lookup(entries, "dhcp6")
            .map(|v| extract_dhcp(&format!("{ctx}.dhcp6"), v, DHCP6_KEYS))
            .transpose()?,
        static4: lookup(entries, "static4")
            .map(|v| extract_static(&format!("{ctx}.static4"), v))
            .transpose()?,
        static6: lookup(entries, "static6")
            .map(|v| extract_static(&format!("{ctx}.static6"), v))
            .transpose()?,
    };

    let mut routes = Vec::new();
    let route_ctx = format!("{ctx}.route");
    for (_, value) in entries.iter().filter(|(k, _)| k == "route") {
        match value {
            Value::List(items) => {
                for item in items {
                    routes.push(extract_route(&route_ctx, item)?);
                }
            }
            single => routes.push(extract_route(&route_ctx, single)?),
        }
    }

    Ok((primary, addressing, routes))
}

/// Resolves the boolean-or-map shorthand into one canonical record.
fn extract_dhcp(ctx: &str, value: &Value, allowed: &[&str]) -> Result<DhcpBlock> {
    match value {
        Value::Bool(enabled) => Ok(DhcpBlock::shorthand(*enabled)),
        Value::Map(entries) => {
            check_keys(ctx, entries, allowed)?;
            let enabled = as_bool(ctx, "enabled", required(ctx, entries, "enabled")?)?;
            let optional = match lookup(entries, "optional") {
                Some(v) => as_bool(ctx, "optional", v)?,
                None => false,
            };
            let route_metric = lookup(entries, "route-metric")
                .map(|v| as_integer(ctx, "route-metric", v))
                .transpose()?;
            Ok(DhcpBlock {
                enabled,
                route_metric,
                optional,
            })
        }
        other => Err(CompileError::schema(format!(
            "'{ctx}' must be a boolean or a map, found {}",
            other.type_name()
        ))),
    }
}

fn extract_static(ctx: &str, value: &Value) -> Result<StaticBlock> {
    let entries = expect_map(ctx, value)?;
    check_keys(ctx, entries, STATIC_KEYS)?;
    let addresses = as_string_list(ctx, "addresses", required(ctx, entries, "addresses")?)?;
    if addresses.is_empty() {
        return Err(CompileError::range(
            format!("{ctx}.addresses"),
            "at least one address is required",
        ));
    }
    Ok(StaticBlock { addresses })
}

fn extract_route(ctx: &str, value: &Value) -> Result<RouteBlock> {
    let entries = expect_map(ctx, value)?;
    check_keys(ctx, entries, ROUTE_KEYS)?;
    let optional_str = |key: &str| -> Result<Option<String>> {
        lookup(entries, key)
            .map(|v| as_str(ctx, key, v).map(str::to_string))
            .transpose()
    };
    Ok(RouteBlock {
        to: required_str(ctx, entries, "to")?.to_string(),
        from: optional_str("from")?,
        via: optional_str("via")?,
        route_metric: lookup(entries, "route-metric")
            .map(|v| as_integer(ctx, "route-metric", v))
            .transpose()?,
    })
}

fn extract_bond(ctx: &str, entries: &Entries) -> Result<BondDevice> {
    let members = as_string_list(ctx, "interfaces", required(ctx, entries, "interfaces")?)?;
    if members.is_empty() {
        return Err(CompileError::range(
            format!("{ctx}.interfaces"),
            "a bond needs at least one member interface",
        ));
    }
    let interfaces = members
        .into_iter()
        .map(EntityName::try_from)
        .collect::<Result<Vec<_>>>()?;

    let params_ctx = format!("{ctx}.parameters");
    let params = expect_map(&params_ctx, required(ctx, entries, "parameters")?)?;
    check_keys(&params_ctx, params, BOND_PARAMETER_KEYS)?;

    let parameters = BondParameterBlock {
        mode: required_str(&params_ctx, params, "mode")?.to_string(),
        min_links: lookup(params, "min-links")
            .map(|v| as_integer(&params_ctx, "min-links", v))
            .transpose()?,
        miimon: lookup(params, "miimon")
            .map(|v| extract_miimon(&format!("{params_ctx}.miimon"), v))
            .transpose()?,
        arpmon: lookup(params, "arpmon")
            .map(|v| extract_arpmon(&format!("{params_ctx}.arpmon"), v))
            .transpose()?,
    };

    Ok(BondDevice {
        interfaces,
        parameters,
    })
}

fn extract_miimon(ctx: &str, value: &Value) -> Result<MiimonBlock> {
    let entries = expect_map(ctx, value)?;
    check_keys(ctx, entries, MIIMON_KEYS)?;
    Ok(MiimonBlock {
        frequency: as_integer(ctx, "frequency", required(ctx, entries, "frequency")?)?,
        updelay: as_integer(ctx, "updelay", required(ctx, entries, "updelay")?)?,
        downdelay: as_integer(ctx, "downdelay", required(ctx, entries, "downdelay")?)?,
    })
}

fn extract_arpmon(ctx: &str, value: &Value) -> Result<ArpmonBlock> {
    let entries = expect_map(ctx, value)?;
    check_keys(ctx, entries, ARPMON_KEYS)?;
    Ok(ArpmonBlock {
        interval: as_integer(ctx, "interval", required(ctx, entries, "interval")?)?,
        validate: required_str(ctx, entries, "validate")?.to_string(),
        targets: as_string_list(ctx, "targets", required(ctx, entries, "targets")?)?,
    })
}

fn extract_vlan(ctx: &str, entries: &Entries) -> Result<VlanDevice> {
    Ok(VlanDevice {
        device: EntityName::try_from(required_str(ctx, entries, "device")?)?,
        id: as_integer(ctx, "id", required(ctx, entries, "id")?)?,
    })
}

/*************************************************************
                       Value helpers
**************************************************************/

/// Rejects keys outside `allowed` and non-repeatable keys given twice.
fn check_keys(ctx: &str, entries: &Entries, allowed: &[&str]) -> Result<()> {
    for (i, (key, _)) in entries.iter().enumerate() {
        if !allowed.contains(&key.as_str()) {
            return Err(CompileError::schema(format!("'{ctx}': unknown key '{key}'")));
        }
        let repeated = entries[..i].iter().any(|(k, _)| k == key);
        if repeated && !REPEATABLE_KEYS.contains(&key.as_str()) {
            return Err(CompileError::schema(format!(
                "'{ctx}': key '{key}' is given more than once"
            )));
        }
    }
    Ok(())
}

fn lookup<'a>(entries: &'a Entries, key: &str) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn required<'a>(ctx: &str, entries: &'a Entries, key: &str) -> Result<&'a Value> {
    lookup(entries, key)
        .ok_or_else(|| CompileError::schema(format!("'{ctx}': missing required key '{key}'")))
}

fn required_str<'a>(ctx: &str, entries: &'a Entries, key: &str) -> Result<&'a str> {
    as_str(ctx, key, required(ctx, entries, key)?)
}

fn expect_map<'a>(ctx: &str, value: &'a Value) -> Result<&'a Entries> {
    value.as_map().ok_or_else(|| {
        CompileError::schema(format!("'{ctx}' must be a map, found {}", value.type_name()))
    })
}

fn type_error(ctx: &str, key: &str, expected: &str, found: &Value) -> CompileError {
    CompileError::schema(format!(
        "'{ctx}.{key}' must be {expected}, found {}",
        found.type_name()
    ))
}

fn as_bool(ctx: &str, key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| type_error(ctx, key, "a boolean", value))
}

fn as_integer(ctx: &str, key: &str, value: &Value) -> Result<i64> {
    value
        .as_integer()
        .ok_or_else(|| type_error(ctx, key, "an integer", value))
}

fn as_str<'a>(ctx: &str, key: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| type_error(ctx, key, "a string", value))
}

fn as_string_list(ctx: &str, key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_list()
        .ok_or_else(|| type_error(ctx, key, "a list of strings", value))?;
    items
        .iter()
        .map(|item| as_str(ctx, key, item).map(str::to_string))
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
