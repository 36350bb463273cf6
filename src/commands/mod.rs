//! Subcommand implementations.

pub mod check;
pub mod completions;
pub mod detect;
pub mod summary;
