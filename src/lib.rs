//! envscope - runtime environment detection
//!
//! This crate answers "where am I running?" for the current process:
//! - OS family and kernel, toolchain runtime
//! - Containers (Docker, WSL, Kubernetes), CI systems and cloud platforms
//! - Privilege level and deployment mode
//!
//! Results are cached with a TTL and exposed through the [`Environment`]
//! facade. Extra detectors can be added at runtime through plugins.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detector;
pub mod detectors;
pub mod environment;
pub mod error;
pub mod plugin;
pub mod probe;
pub mod registry;

// Re-export commonly used types
pub use config::Config;
pub use environment::{Environment, EnvironmentInfo};
pub use error::{EnvscopeError, Result};
