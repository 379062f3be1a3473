//! Plugin metadata and the error type shared by all plugins.

use chain_clients_common::ConnectorError;
use serde::Serialize;
use thiserror::Error;

use crate::keychain::KeychainError;
use crate::registry::RegistryError;

/// Role a plugin plays in the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PluginAspect {
    #[serde(rename = "HTLC")]
    Htlc,
    #[serde(rename = "BUSINESS_LOGIC")]
    BusinessLogic,
}

pub trait Plugin: Send + Sync {
    fn instance_id(&self) -> &str;
    fn package_name(&self) -> &'static str;
    fn aspect(&self) -> PluginAspect;

    fn info(&self) -> PluginInfo {
        PluginInfo {
            instance_id: self.instance_id().to_string(),
            package_name: self.package_name().to_string(),
            aspect: self.aspect(),
        }
    }
}

/// Metadata reported by `GET /api/v1/plugins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub instance_id: String,
    pub package_name: String,
    pub aspect: PluginAspect,
}

#[derive(Debug, Error)]
pub enum PluginError {
    /// Malformed request input; nothing was sent to a ledger
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Keychain(#[from] KeychainError),
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    /// The connector answered with something the plugin cannot interpret
    #[error("unexpected connector output: {0}")]
    UnexpectedOutput(String),
    /// The plugin was set up without what the operation needs
    #[error("{0}")]
    NotConfigured(String),
}

impl PluginError {
    /// HTTP status the API answers with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::Registry(_) => 404,
            Self::Keychain(KeychainError::KeyNotFound { .. }) => 404,
            Self::Keychain(_)
            | Self::Connector(_)
            | Self::UnexpectedOutput(_)
            | Self::NotConfigured(_) => 500,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Resolves the instance id of a plugin: the configured one, or a fresh v4 UUID.
///
/// Returns an error when a configured id is blank.
pub fn instance_id_or_generate(configured: Option<&str>) -> Result<String, PluginError> {
    match configured {
        Some(id) if id.trim().is_empty() => Err(PluginError::invalid("instanceId must not be blank")),
        Some(id) => Ok(id.to_string()),
        None => Ok(uuid::Uuid::new_v4().to_string()),
    }
}
