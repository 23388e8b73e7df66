#![cfg(test)]
use bootnet_common::error::ErrorKind;
use bootnet_core::plan::Action;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::util::{arp_targets, compile_err, compile_ok, miimon};

/*************************************************************
                     Creation order
**************************************************************/

#[test]
fn vlan_on_later_bond_is_created_after_it() {
    let plan = compile_ok(json!({
        "version": 3,
        "eno1": {},
        "eno2": {},
        "device": {
            "vlan42": { "type": "vlan", "device": "bond0", "id": 42, "dhcp4": true },
            "vlan7": { "type": "vlan", "device": "eno1", "id": 7 },
            "bond0": {
                "type": "bond",
                "interfaces": ["eno2"],
                "parameters": { "mode": "active-backup", "miimon": miimon() }
            }
        }
    }));

    assert_eq!(plan.names(), vec!["eno1", "eno2", "vlan7", "bond0", "vlan42"]);
    assert_eq!(plan.entry("vlan42").unwrap().depends_on, vec!["bond0"]);
    assert_eq!(
        plan.entry("vlan42").unwrap().action,
        Action::Vlan { device: "bond0".try_into().unwrap(), id: 42 }
    );
}

#[test]
fn implicit_primary_is_the_outermost_device() {
    let plan = compile_ok(json!({
        "version": 3,
        "eno1": {},
        "device": {
            "vlan3": { "type": "vlan", "device": "eno1", "id": 3, "dhcp4": true }
        }
    }));
    assert_eq!(plan.primary, "vlan3");
}

#[test]
fn dependency_cycle_is_reported() {
    let kind = compile_err(json!({
        "version": 3,
        "device": {
            "vlan1": { "type": "vlan", "device": "vlan2", "id": 1 },
            "vlan2": { "type": "vlan", "device": "vlan1", "id": 2 }
        }
    }));
    assert_eq!(kind, ErrorKind::Cycle);
}

#[test]
fn missing_parent_is_a_reference_error() {
    let kind = compile_err(json!({
        "version": 3,
        "device": { "vlan1": { "type": "vlan", "device": "eno9", "id": 1 } }
    }));
    assert_eq!(kind, ErrorKind::Reference);
}

/*************************************************************
                         Bonds
**************************************************************/

#[test]
fn bond_needs_exactly_one_monitor() {
    let both = compile_err(json!({
        "version": 3,
        "eno1": {},
        "device": {
            "bond0": {
                "type": "bond",
                "interfaces": ["eno1"],
                "parameters": {
                    "mode": "active-backup",
                    "miimon": miimon(),
                    "arpmon": { "interval": 200, "validate": "all", "targets": arp_targets(1) }
                }
            }
        }
    }));
    assert_eq!(both, ErrorKind::Conflict);

    let neither = compile_err(json!({
        "version": 3,
        "eno1": {},
        "device": {
            "bond0": {
                "type": "bond",
                "interfaces": ["eno1"],
                "parameters": { "mode": "active-backup" }
            }
        }
    }));
    assert_eq!(neither, ErrorKind::Conflict);
}

fn arpmon_bond(targets: usize) -> serde_json::Value {
    json!({
        "version": 3,
        "eno1": {},
        "eno2": {},
        "device": {
            "bond0": {
                "type": "bond",
                "interfaces": ["eno1", "eno2"],
                "dhcp4": true,
                "parameters": {
                    "mode": "active-backup",
                    "min-links": 1,
                    "arpmon": { "interval": 200, "validate": "all", "targets": arp_targets(targets) }
                }
            }
        }
    })
}

#[test]
fn arp_targets_are_capped_at_sixteen() {
    let plan = compile_ok(arpmon_bond(16));
    let Action::Bond { members, .. } = &plan.entry("bond0").unwrap().action else {
        panic!("bond0 should compile to a bond");
    };
    assert_eq!(members, &vec!["eno1", "eno2"]);

    assert_eq!(compile_err(arpmon_bond(17)), ErrorKind::Range);
}

#[test]
fn interface_in_two_bonds_conflicts() {
    let kind = compile_err(json!({
        "version": 3,
        "eno1": {},
        "device": {
            "bond0": { "type": "bond", "interfaces": ["eno1"],
                       "parameters": { "mode": "active-backup", "miimon": miimon() } },
            "bond1": { "type": "bond", "interfaces": ["eno1"],
                       "parameters": { "mode": "active-backup", "miimon": miimon() } }
        }
    }));
    assert_eq!(kind, ErrorKind::Conflict);
}

#[test]
fn addressed_bond_member_conflicts() {
    let kind = compile_err(json!({
        "version": 3,
        "eno1": { "dhcp4": true },
        "device": {
            "bond0": { "type": "bond", "interfaces": ["eno1"],
                       "parameters": { "mode": "active-backup", "miimon": miimon() } }
        }
    }));
    assert_eq!(kind, ErrorKind::Conflict);
}

#[test]
fn vlan_ids_are_bounded() {
    for (id, ok) in [(0, false), (1, true), (4094, true), (4095, false)] {
        let result = crate::util::compile(json!({
            "version": 3,
            "eno1": {},
            "device": { "vlan1": { "type": "vlan", "device": "eno1", "id": id } }
        }));
        match ok {
            true => assert!(result.is_ok(), "id {id} should be accepted"),
            false => assert_eq!(result.unwrap_err().kind(), ErrorKind::Range),
        }
    }
}
