#![cfg(test)]
use std::net::{IpAddr, Ipv4Addr};

use bootnet_common::error::ErrorKind;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::util::{compile_err, compile_ok};

/*************************************************************
                   Ordering and primary
**************************************************************/

#[test]
fn version_two_keeps_file_order() {
    let plan = compile_ok(json!({
        "version": 2,
        "eth9": { "dhcp4": true },
        "eno1": {},
        "ens3": { "dhcp6": true },
        "eno0": {}
    }));
    assert_eq!(plan.names(), vec!["eth9", "eno1", "ens3", "eno0"]);
    assert!(plan.entries.iter().all(|e| e.depends_on.is_empty()));
}

#[test]
fn first_entity_is_primary_when_none_is_marked() {
    let plan = compile_ok(json!({
        "version": 2,
        "eno1": { "dhcp4": true },
        "eno2": { "dhcp4": true },
        "eno3": { "dhcp4": true }
    }));
    assert_eq!(plan.primary, "eno1");
    let flagged: Vec<&str> = plan
        .entries
        .iter()
        .filter(|e| e.primary)
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(flagged, vec!["eno1"]);
}

#[test]
fn marked_primary_wins_over_file_order() {
    let plan = compile_ok(json!({
        "version": 2,
        "eno1": { "dhcp4": true },
        "eno2": { "primary": true, "static4": { "addresses": ["192.168.1.5/24"] } }
    }));
    assert_eq!(plan.primary, "eno2");
    assert_eq!(
        plan.primary_address,
        Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)))
    );
}

#[test]
fn two_primaries_are_ambiguous() {
    let kind = compile_err(json!({
        "version": 2,
        "eno1": { "primary": true },
        "eno2": { "dhcp4": true },
        "eno3": { "primary": true }
    }));
    assert_eq!(kind, ErrorKind::AmbiguousPrimary);
}

/*************************************************************
                      Addressing
**************************************************************/

#[test]
fn dhcp_and_static_on_one_family_conflict() {
    let kind = compile_err(json!({
        "version": 2,
        "eno1": {
            "dhcp4": { "enabled": true },
            "static4": { "addresses": ["10.0.0.2/24"] }
        }
    }));
    assert_eq!(kind, ErrorKind::Conflict);
}

#[test]
fn dhcp_and_static_on_different_families_coexist() {
    let plan = compile_ok(json!({
        "version": 2,
        "eno1": {
            "dhcp4": true,
            "static6": { "addresses": ["2001:db8::10/64"] }
        }
    }));
    let addressing = &plan.entry("eno1").unwrap().addressing;
    assert!(addressing.dhcp4.is_some());
    assert_eq!(addressing.static6, vec!["2001:db8::10/64"]);
    assert_eq!(plan.primary_address, Some("2001:db8::10".parse().unwrap()));
}

#[test]
fn round_trip_version_two_example() {
    let plan = compile_ok(json!({
        "version": 2,
        "eno1": { "primary": true, "dhcp4": true, "dhcp6": true },
        "eno2": {
            "dhcp4": { "enabled": true, "route-metric": 200 },
            "dhcp6": { "enabled": true, "optional": true }
        },
        "eno3": {
            "static4": { "addresses": ["10.0.0.10/24", "11.0.0.11/24"] },
            "route": [
                { "to": "default", "via": "10.0.0.1", "route-metric": 200 },
                { "to": "default", "via": "11.0.0.1", "route-metric": 100 }
            ]
        },
        "eno4": {
            "static4": { "addresses": ["192.168.14.5/24"] },
            "route": { "to": "10.10.10.0/24", "from": "192.168.14.5", "via": "192.168.14.25" }
        }
    }));

    assert_eq!(plan.primary, "eno1");
    assert_eq!(plan.primary_address, None);
    assert_eq!(plan.names(), vec!["eno1", "eno2", "eno3", "eno4"]);

    let eno2 = &plan.entry("eno2").unwrap().addressing;
    assert_eq!(eno2.dhcp4.and_then(|d| d.route_metric), Some(200));
    assert!(eno2.dhcp6.is_some_and(|d| d.optional));

    let eno3 = &plan.entry("eno3").unwrap().addressing;
    assert_eq!(eno3.static4, vec!["10.0.0.10/24", "11.0.0.11/24"]);
    let metrics: Vec<Option<u32>> = eno3.routes.iter().map(|r| r.route_metric).collect();
    assert_eq!(metrics, vec![Some(100), Some(200)]);
    assert!(eno3.routes.iter().all(|r| r.to == "default"));
    assert_eq!(eno3.routes[0].via, Some("11.0.0.1".parse().unwrap()));

    let eno4 = &plan.entry("eno4").unwrap().addressing;
    assert_eq!(eno4.routes.len(), 1);
    assert_eq!(eno4.routes[0].to, "10.10.10.0/24");
    assert_eq!(eno4.routes[0].route_metric, None);
}

#[test]
fn same_input_gives_identical_output() {
    let doc = json!({
        "version": 2,
        "eno2": { "static4": { "addresses": ["10.1.0.2/16"] } },
        "eno1": { "dhcp4": true }
    });
    let first = serde_json::to_string(&compile_ok(doc.clone())).unwrap();
    let second = serde_json::to_string(&compile_ok(doc)).unwrap();
    assert_eq!(first, second);
}

/*************************************************************
                      Schema errors
**************************************************************/

#[test]
fn devices_need_version_three() {
    let kind = compile_err(json!({
        "version": 2,
        "eno1": {},
        "device": { "vlan5": { "type": "vlan", "device": "eno1", "id": 5 } }
    }));
    assert_eq!(kind, ErrorKind::Schema);
}

#[test]
fn unknown_keys_and_bad_names_are_rejected() {
    let unknown = compile_err(json!({ "version": 2, "eno1": { "mtu": 9000 } }));
    assert_eq!(unknown, ErrorKind::Schema);

    let dotted = compile_err(json!({ "version": 2, "eno1.5": {} }));
    assert_eq!(dotted, ErrorKind::Schema);

    let too_long = compile_err(json!({ "version": 2, "a-very-long-name0": {} }));
    assert_eq!(too_long, ErrorKind::Schema);
}

#[test]
fn missing_version_is_rejected() {
    assert_eq!(compile_err(json!({ "eno1": {} })), ErrorKind::Schema);
    assert_eq!(compile_err(json!({ "version": 1, "eno1": {} })), ErrorKind::Schema);
}
