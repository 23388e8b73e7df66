//! # Schema Resolver
//!
//! Reads the document's `version` and selects the closed set of features
//! that version allows. Each version is a self-contained ruleset; nothing
//! is inherited from an older one.

use bootnet_common::document::Value;
use bootnet_common::error::{CompileError, Result};
use tracing::debug;

pub const VERSION_KEY: &str = "version";
pub const DEVICE_SECTION: &str = "device";

const INTERFACE_KEYS: &[&str] = &["primary", "dhcp4", "dhcp6", "static4", "static6", "route"];

const BOND_KEYS: &[&str] = &[
    "type", "primary", "dhcp4", "dhcp6", "static4", "static6", "route", "interfaces", "parameters",
];

const VLAN_KEYS: &[&str] = &[
    "type", "primary", "dhcp4", "dhcp6", "static4", "static6", "route", "device", "id",
];

/// Keys that only make sense on a logical device.
pub const DEVICE_ONLY_KEYS: &[&str] = &["type", "interfaces", "parameters", "device", "id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V2,
    V3,
}

/// What a given schema version allows. Fixed per version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    pub interface_keys: &'static [&'static str],
    pub bond_keys: &'static [&'static str],
    pub vlan_keys: &'static [&'static str],
    /// Bond and vlan devices under the `device.<name>` section.
    pub devices: bool,
}

const V2_FEATURES: FeatureSet = FeatureSet {
    interface_keys: INTERFACE_KEYS,
    bond_keys: &[],
    vlan_keys: &[],
    devices: false,
};

const V3_FEATURES: FeatureSet = FeatureSet {
    interface_keys: INTERFACE_KEYS,
    bond_keys: BOND_KEYS,
    vlan_keys: VLAN_KEYS,
    devices: true,
};

impl SchemaVersion {
    pub fn number(self) -> i64 {
        match self {
            SchemaVersion::V2 => 2,
            SchemaVersion::V3 => 3,
        }
    }

    pub fn features(self) -> &'static FeatureSet {
        match self {
            SchemaVersion::V2 => &V2_FEATURES,
            SchemaVersion::V3 => &V3_FEATURES,
        }
    }
}

impl TryFrom<i64> for SchemaVersion {
    type Error = CompileError;

    fn try_from(version: i64) -> Result<Self> {
        match version {
            2 => Ok(SchemaVersion::V2),
            3 => Ok(SchemaVersion::V3),
            other => Err(CompileError::schema(format!(
                "unsupported version {other}, expected 2 or 3"
            ))),
        }
    }
}

/// Determines the document's schema version.
pub fn resolve(doc: &Value) -> Result<SchemaVersion> {
    let entries = doc
        .as_map()
        .ok_or_else(|| CompileError::schema(format!("document must be a map, found {}", doc.type_name())))?;

    let mut versions = entries.iter().filter(|(k, _)| k == VERSION_KEY).map(|(_, v)| v);
    let value = versions
        .next()
        .ok_or_else(|| CompileError::schema("missing required 'version' field"))?;
    if versions.next().is_some() {
        return Err(CompileError::schema("'version' is declared more than once"));
    }

    let number = value.as_integer().ok_or_else(|| {
        CompileError::schema(format!("'version' must be an integer, found {}", value.type_name()))
    })?;
    let version = SchemaVersion::try_from(number)?;
    debug!("Resolved network configuration schema version {}", version.number());
    Ok(version)
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
    use serde_json::json;

    fn resolve_json(doc: serde_json::Value) -> Result<SchemaVersion> {
        resolve(&Value::from(doc))
    }

    #[test]
    fn supported_versions_resolve() {
        assert_eq!(resolve_json(json!({ "version": 2 })), Ok(SchemaVersion::V2));
        assert_eq!(resolve_json(json!({ "version": 3, "eno1": {} })), Ok(SchemaVersion::V3));
    }

    #[test]
    fn missing_or_unsupported_version_is_rejected() {
        for doc in [
            json!({ "eno1": { "dhcp4": true } }),
            json!({ "version": 1 }),
            json!({ "version": 4 }),
            json!({ "version": "2" }),
            json!([2]),
        ] {
            assert_eq!(resolve_json(doc).unwrap_err().kind(), ErrorKind::Schema);
        }
    }

    #[test]
    fn duplicated_version_is_rejected() {
        let doc = Value::map([("version", Value::Integer(2)), ("version", Value::Integer(3))]);
        assert_eq!(resolve(&doc).unwrap_err().kind(), ErrorKind::Schema);
    }

    #[test]
    fn only_version_three_allows_devices() {
        assert!(!SchemaVersion::V2.features().devices);
        assert!(SchemaVersion::V3.features().devices);
        assert!(SchemaVersion::V2.features().bond_keys.is_empty());
        assert!(SchemaVersion::V3.features().vlan_keys.contains(&"id"));
    }
}
