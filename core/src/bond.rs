//! # Bond Parameter Compiler
//!
//! Validates a bond's mode, `min-links` and its link monitoring block.
//! A bond watches its members either by polling link state (MII) or by
//! sending ARP probes; exactly one of the two must be configured.

use bootnet_common::error::{CompileError, Result};
use pnet::ipnetwork::Ipv4Network;
use serde::{Serialize, Serializer};

use crate::addressing::parse_cidr;
use crate::model::{ArpmonBlock, BondDevice, MiimonBlock};

/// Most ARP targets the kernel bonding driver accepts.
pub const MAX_ARP_TARGETS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BondMode {
    ActiveBackup,
}

impl TryFrom<&str> for BondMode {
    type Error = CompileError;

    fn try_from(mode: &str) -> Result<Self> {
        match mode {
            "active-backup" => Ok(BondMode::ActiveBackup),
            other => Err(CompileError::schema(format!(
                "unsupported bond mode '{other}', expected 'active-backup'"
            ))),
        }
    }
}

/// Which members an ARP probe reply is validated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArpValidate {
    All,
    None,
    Active,
    Backup,
}

impl TryFrom<&str> for ArpValidate {
    type Error = CompileError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "all" => Ok(ArpValidate::All),
            "none" => Ok(ArpValidate::None),
            "active" => Ok(ArpValidate::Active),
            "backup" => Ok(ArpValidate::Backup),
            other => Err(CompileError::schema(format!(
                "invalid arpmon validate value '{other}', expected one of all, none, active, backup"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Monitoring {
    Miimon {
        frequency_ms: u32,
        updelay_ms: u32,
        downdelay_ms: u32,
    },
    Arpmon {
        interval_secs: u32,
        validate: ArpValidate,
        #[serde(serialize_with = "serialize_targets")]
        targets: Vec<Ipv4Network>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondParameters {
    pub mode: BondMode,
    #[serde(rename = "min-links")]
    pub min_links: u32,
    pub monitoring: Monitoring,
}

/// Validates the parameters of the bond named `name`.
pub fn compile(name: &str, bond: &BondDevice) -> Result<BondParameters> {
    let params = &bond.parameters;
    let ctx = format!("{name}.parameters");

    let mode = BondMode::try_from(params.mode.as_str())?;

    let min_links = match params.min_links {
        None => 0,
        Some(n) if n < 0 => {
            return Err(CompileError::range(format!("{ctx}.min-links"), format!("{n} is negative")));
        }
        Some(n) if n as usize > bond.interfaces.len() => {
            return Err(CompileError::range(
                format!("{ctx}.min-links"),
                format!("{n} exceeds the bond's {} member interface(s)", bond.interfaces.len()),
            ));
        }
        Some(n) => n as u32,
    };

    let monitoring = match (&params.miimon, &params.arpmon) {
        (Some(miimon), None) => compile_miimon(&format!("{ctx}.miimon"), miimon)?,
        (None, Some(arpmon)) => compile_arpmon(&format!("{ctx}.arpmon"), arpmon)?,
        (Some(_), Some(_)) => {
            return Err(CompileError::conflict(format!(
                "bond '{name}' configures both miimon and arpmon, choose one"
            )));
        }
        (None, None) => {
            return Err(CompileError::conflict(format!(
                "bond '{name}' needs exactly one of miimon or arpmon"
            )));
        }
    };

    Ok(BondParameters {
        mode,
        min_links,
        monitoring,
    })
}

fn compile_miimon(ctx: &str, block: &MiimonBlock) -> Result<Monitoring> {
    Ok(Monitoring::Miimon {
        frequency_ms: non_negative(ctx, "frequency", block.frequency)?,
        updelay_ms: non_negative(ctx, "updelay", block.updelay)?,
        downdelay_ms: non_negative(ctx, "downdelay", block.downdelay)?,
    })
}

fn compile_arpmon(ctx: &str, block: &ArpmonBlock) -> Result<Monitoring> {
    let interval_secs = non_negative(ctx, "interval", block.interval)?;
    if interval_secs == 0 {
        return Err(CompileError::range(format!("{ctx}.interval"), "must be at least 1 second"));
    }

    let validate = ArpValidate::try_from(block.validate.as_str())?;

    if block.targets.is_empty() || block.targets.len() > MAX_ARP_TARGETS {
        return Err(CompileError::range(
            format!("{ctx}.targets"),
            format!(
                "{} target(s) given, between 1 and {MAX_ARP_TARGETS} are allowed",
                block.targets.len()
            ),
        ));
    }
    let targets = block
        .targets
        .iter()
        .map(|target| parse_cidr::<Ipv4Network>(&format!("{ctx}.targets"), target))
        .collect::<Result<Vec<_>>>()?;

    Ok(Monitoring::Arpmon {
        interval_secs,
        validate,
        targets,
    })
}

fn non_negative(ctx: &str, key: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        CompileError::range(format!("{ctx}.{key}"), format!("{value} is not between 0 and {}", u32::MAX))
    })
}

fn serialize_targets<S: Serializer>(
    targets: &[Ipv4Network],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(targets.iter().map(ToString::to_string))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
