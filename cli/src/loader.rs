//! # Document Loader
//!
//! Reads the network document from disk and turns it into the generic
//! [`Value`] tree the compiler consumes. The format follows the file
//! extension; both parsers keep table order.

use std::fs;
use std::path::Path;

use anyhow::Context;
use bootnet_common::document::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            _ => anyhow::bail!(
                "cannot tell the format of '{}', expected a .toml or .json file",
                path.display()
            ),
        }
    }
}

/// Loads and parses the document at `path`.
pub fn load(path: &Path) -> anyhow::Result<Value> {
    let format = Format::from_path(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read network document '{}'", path.display()))?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    parse(&text, format).with_context(|| format!("failed to parse '{}'", path.display()))
}

pub fn parse(text: &str, format: Format) -> anyhow::Result<Value> {
    match format {
        Format::Toml => {
            let table: toml::Table = toml::from_str(text)?;
            Ok(from_toml(toml::Value::Table(table)))
        }
        Format::Json => Ok(serde_json::from_str::<Value>(text)?),
    }
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => {
            Value::Map(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
