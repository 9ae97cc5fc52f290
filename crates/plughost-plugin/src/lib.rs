//! Discovery and fault-isolated loading of native plugin libraries.
//!
//! A pass resolves candidate directories from a [`Configuration`], scans
//! each for shared libraries, and hands them to a [`HostRuntime`] one by
//! one. A plugin that fails to load is recorded in the [`InitReport`] and
//! the pass moves on.

pub mod abi;
pub mod artifact;
pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod loader;
pub mod report;
pub mod resolver;

pub use artifact::{ArtifactKind, DirectoryOrigin, PluginArtifact, PluginDirectory};
pub use config::{Configuration, DiscoverySettings};
pub use error::{ConfigError, LoaderError};
pub use host::{DynamicHost, HostRuntime, PluginHandle};
pub use loader::{initialize, DiscoveryPlan, PluginLoader};
pub use report::{InitReport, LoadOutcome, LoadResult};
