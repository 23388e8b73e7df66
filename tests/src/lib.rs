//! End-to-end tests driving documents through the whole compiler.

#[cfg(test)]
mod util;

mod compile;
