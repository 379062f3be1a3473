//! Plugin registry
//!
//! Holds the ledger connectors and keychains of the node, addressed by id.
//! Plugins look them up per request; nothing is resolved at construction.

use anyhow::Context;
use chain_clients_evm::{ConnectorFlavor, Web3Connector, Web3ConnectorClient};
use chain_clients_fabric::{FabricConnector, FabricConnectorClient};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConnectorKind, KeychainKind};
use crate::dev_ledger::{Clock, DevLedger};
use crate::keychain::{Keychain, MemoryKeychain, RemoteKeychain};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no web3 connector with id '{0}'")]
    Web3ConnectorNotFound(String),
    #[error("no fabric connector with id '{0}'")]
    FabricConnectorNotFound(String),
    #[error("no keychain with id '{0}'")]
    KeychainNotFound(String),
    #[error("a {kind} with id '{id}' is already registered")]
    Duplicate { kind: &'static str, id: String },
}

#[derive(Default)]
pub struct PluginRegistry {
    web3_connectors: HashMap<String, Arc<dyn Web3Connector>>,
    fabric_connectors: HashMap<String, Arc<dyn FabricConnector>>,
    keychains: HashMap<String, Arc<dyn Keychain>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a web3 connector under its instance id.
    pub fn add_web3_connector(&mut self, connector: Arc<dyn Web3Connector>) -> Result<(), RegistryError> {
        let id = connector.instance_id().to_string();
        if self.web3_connectors.contains_key(&id) || self.fabric_connectors.contains_key(&id) {
            return Err(RegistryError::Duplicate { kind: "connector", id });
        }
        self.web3_connectors.insert(id, connector);
        Ok(())
    }

    /// Registers a Fabric connector under its instance id.
    pub fn add_fabric_connector(&mut self, connector: Arc<dyn FabricConnector>) -> Result<(), RegistryError> {
        let id = connector.instance_id().to_string();
        if self.web3_connectors.contains_key(&id) || self.fabric_connectors.contains_key(&id) {
            return Err(RegistryError::Duplicate { kind: "connector", id });
        }
        self.fabric_connectors.insert(id, connector);
        Ok(())
    }

    /// Registers a keychain under its keychain id.
    pub fn add_keychain(&mut self, keychain: Arc<dyn Keychain>) -> Result<(), RegistryError> {
        let id = keychain.keychain_id().to_string();
        if self.keychains.contains_key(&id) {
            return Err(RegistryError::Duplicate { kind: "keychain", id });
        }
        self.keychains.insert(id, keychain);
        Ok(())
    }

    pub fn find_web3_connector(&self, id: &str) -> Result<Arc<dyn Web3Connector>, RegistryError> {
        self.web3_connectors
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::Web3ConnectorNotFound(id.to_string()))
    }

    pub fn find_fabric_connector(&self, id: &str) -> Result<Arc<dyn FabricConnector>, RegistryError> {
        self.fabric_connectors
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::FabricConnectorNotFound(id.to_string()))
    }

    pub fn find_keychain(&self, id: &str) -> Result<Arc<dyn Keychain>, RegistryError> {
        self.keychains
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::KeychainNotFound(id.to_string()))
    }

    /// Ids of all registered connectors, sorted.
    pub fn connector_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .web3_connectors
            .keys()
            .chain(self.fabric_connectors.keys())
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Ids of all registered keychains, sorted.
    pub fn keychain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.keychains.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Builds the registry described by `config`.
    ///
    /// Remote connectors and keychains only get an HTTP client here; they are
    /// not contacted until a request needs them. Dev ledgers share `clock`.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let mut registry = Self::new();

        for connector in &config.connectors {
            let timeout = Duration::from_millis(connector.timeout_ms);
            let url = connector.url.as_deref().unwrap_or_default();
            match connector.kind {
                ConnectorKind::Besu | ConnectorKind::Quorum => {
                    let flavor = if connector.kind == ConnectorKind::Besu {
                        ConnectorFlavor::Besu
                    } else {
                        ConnectorFlavor::Quorum
                    };
                    let client = Web3ConnectorClient::new(&connector.id, url, flavor, timeout)
                        .with_context(|| format!("Failed to create connector '{}'", connector.id))?;
                    registry.add_web3_connector(Arc::new(client))?;
                }
                ConnectorKind::Fabric => {
                    let client = FabricConnectorClient::new(&connector.id, url, timeout)
                        .with_context(|| format!("Failed to create connector '{}'", connector.id))?;
                    registry.add_fabric_connector(Arc::new(client))?;
                }
                ConnectorKind::Dev => {
                    let genesis = connector.dev.clone().unwrap_or_default();
                    let ledger = DevLedger::from_config(&connector.id, &genesis, clock.clone())
                        .with_context(|| format!("Failed to create dev ledger '{}'", connector.id))?;
                    registry.add_web3_connector(Arc::new(ledger))?;
                }
            }
            info!("Registered {:?} connector '{}'", connector.kind, connector.id);
        }

        for keychain in &config.keychains {
            let instance_id = keychain
                .instance_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let keychain_plugin: Arc<dyn Keychain> = match keychain.kind {
                KeychainKind::Memory => {
                    let entries = keychain
                        .entries
                        .iter()
                        .map(|e| (e.key.clone(), e.value.clone()))
                        .collect::<HashMap<_, _>>();
                    Arc::new(MemoryKeychain::with_entries(&keychain.id, &instance_id, entries))
                }
                KeychainKind::Remote => Arc::new(
                    RemoteKeychain::new(
                        &keychain.id,
                        &instance_id,
                        keychain.url.as_deref().unwrap_or_default(),
                        Duration::from_millis(keychain.timeout_ms),
                    )
                    .with_context(|| format!("Failed to create keychain '{}'", keychain.id))?,
                ),
            };
            registry.add_keychain(keychain_plugin)?;
            info!("Registered {:?} keychain '{}'", keychain.kind, keychain.id);
        }

        Ok(registry)
    }
}
