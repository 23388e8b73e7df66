pub mod config;
pub mod document;
pub mod error;
pub mod name;

pub use error::{CompileError, ErrorKind};
pub use name::EntityName;
