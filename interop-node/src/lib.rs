//! Interop Node Library
//!
//! Hosts HTLC and business-logic plugins on top of pluggable ledger
//! connectors. Plugins resolve connectors and keychains by id through the
//! [`registry::PluginRegistry`] and are exposed over a REST API.

pub mod api;
pub mod artifact;
pub mod config;
pub mod dev_ledger;
pub mod htlc;
pub mod keychain;
pub mod plugin;
pub mod registry;
pub mod supply_chain;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ConnectorConfig, ConnectorKind, KeychainConfig, KeychainKind};
pub use plugin::{Plugin, PluginAspect, PluginError, PluginInfo};
pub use registry::{PluginRegistry, RegistryError};
