//! Core types and configuration for autoship.
//!
//! This crate defines the `autoship.toml` schema ([`AutoshipConfig`]),
//! project scanning ([`scan`], [`ProjectDescriptor`]), the run log
//! ([`EventLog`], [`RunLog`]), and shared error types.

pub mod config;
pub mod error;
pub mod log;
pub mod project;

pub use config::{AutoshipConfig, BuildConfig, KubernetesConfig, ProxyConfig, RunConfig};
pub use error::{Error, Result};
pub use log::{EventLog, MemoryLog, RunLog};
pub use project::{ImageReference, ProjectDescriptor, ProjectType, scan, walk_files};
