//! # Compilation Errors
//!
//! Every failure the compiler can report. All of them are fatal: a run that
//! produces one of these never emits a plan.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Coarse classification of a [`CompileError`], handy for callers that only
/// care about which rule was broken.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// Unsupported or missing version, unknown key, duplicate name, malformed value.
    Schema,
    /// A device refers to an entity that does not exist (or has the wrong type).
    Reference,
    /// Two pieces of configuration that cannot coexist.
    Conflict,
    /// The device dependency graph loops back on itself.
    Cycle,
    /// A numeric field or list length is outside its bound.
    Range,
    /// More than one entity carries `primary = true`.
    AmbiguousPrimary,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CompileError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("'{entity}' references '{target}': {reason}")]
    Reference {
        entity: String,
        target: String,
        reason: String,
    },

    #[error("conflicting configuration: {0}")]
    Conflict(String),

    #[error("device dependency cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("'{field}' is out of range: {detail}")]
    Range { field: String, detail: String },

    #[error("more than one entity is marked primary ('{first}' and '{second}')")]
    AmbiguousPrimary { first: String, second: String },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Schema(_) => ErrorKind::Schema,
            CompileError::Reference { .. } => ErrorKind::Reference,
            CompileError::Conflict(_) => ErrorKind::Conflict,
            CompileError::Cycle { .. } => ErrorKind::Cycle,
            CompileError::Range { .. } => ErrorKind::Range,
            CompileError::AmbiguousPrimary { .. } => ErrorKind::AmbiguousPrimary,
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        CompileError::Schema(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CompileError::Conflict(msg.into())
    }

    pub fn reference(
        entity: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CompileError::Reference {
            entity: entity.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn range(field: impl Into<String>, detail: impl Into<String>) -> Self {
        CompileError::Range {
            field: field.into(),
            detail: detail.into(),
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
