//! Entity names follow the kernel's rules for network device names.
//! <https://elixir.bootlin.com/linux/v5.10.102/source/net/core/dev.c#L1138>

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Serialize, Serializer};

use crate::error::{CompileError, Result};

/// Longest name the kernel accepts (`IFNAMSIZ` minus the trailing NUL).
pub const MAX_NAME_LEN: usize = 15;

const LINE_TERMINATORS: [char; 7] = [
    '\n', '\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}',
];

/// A validated interface or device name. Interfaces and devices share a single namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityName(String);

impl EntityName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EntityName {
    type Error = CompileError;

    fn try_from(input: &str) -> Result<Self> {
        let invalid = |msg: &str| CompileError::schema(format!("invalid name '{input}': {msg}"));

        // `lines()` does not split on every Unicode terminator, so check them explicitly.
        if input.contains(&LINE_TERMINATORS[..]) {
            return Err(invalid("contains line terminators"));
        }
        if input.is_empty() || input.len() > MAX_NAME_LEN {
            return Err(invalid("must be 1 to 15 characters long"));
        }
        if input.contains('.') || input.contains('/') || input.contains(char::is_whitespace) {
            return Err(invalid("contains invalid characters"));
        }

        Ok(Self(input.to_string()))
    }
}

impl TryFrom<String> for EntityName {
    type Error = CompileError;

    fn try_from(input: String) -> Result<Self> {
        Self::try_from(input.as_str())
    }
}

impl Deref for EntityName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for EntityName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for EntityName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
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
