//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the interop node.
//! Configuration includes the API binding, the ledger connectors and keychains
//! to register, and per-plugin settings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::dev_ledger::ProgramKind;

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "INTEROP_NODE_CONFIG_PATH";
/// Prefix of env vars overriding individual settings (`INTEROP_NODE__API__PORT`).
pub const ENV_PREFIX: &str = "INTEROP_NODE";
const DEFAULT_CONFIG_PATH: &str = "config/node.toml";

/// Gas limit used when a request carries none.
pub const DEFAULT_ESTIMATED_GAS: u64 = 6_721_975;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all node settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,
    /// Ledger connectors registered under their ids
    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
    /// Keychains registered under their ids
    #[serde(default)]
    pub keychains: Vec<KeychainConfig>,
    /// HTLC plugin driving the native-value lock contract
    #[serde(default)]
    pub htlc: HtlcPluginConfig,
    /// HTLC plugin driving the ERC-20 lock contract
    #[serde(default)]
    pub htlc_erc20: HtlcPluginConfig,
    /// Supply-chain plugin (optional; its routes are not served without it)
    #[serde(default)]
    pub supply_chain: Option<SupplyChainConfig>,
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// Remote Besu connector
    Besu,
    /// Remote Quorum connector
    Quorum,
    /// Remote Fabric connector
    Fabric,
    /// In-process development ledger
    Dev,
}

/// One ledger connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Id plugins use to select this connector
    pub id: String,
    pub kind: ConnectorKind,
    /// Base URL of the connector service (remote kinds only)
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Genesis state of a dev ledger
    #[serde(default)]
    pub dev: Option<DevLedgerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevLedgerConfig {
    /// Funded accounts at genesis
    #[serde(default)]
    pub accounts: Vec<DevAccountConfig>,
    /// Bytecodes the ledger accepts for deployment, by program kind
    #[serde(default)]
    pub programs: Vec<DevProgramConfig>,
    /// Programs installed at fixed addresses at genesis
    #[serde(default)]
    pub predeployed: Vec<DevPredeployConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevAccountConfig {
    pub address: String,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevProgramConfig {
    pub kind: ProgramKind,
    pub bytecode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevPredeployConfig {
    pub kind: ProgramKind,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeychainKind {
    Memory,
    Remote,
}

/// One keychain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeychainConfig {
    /// Keychain id requests refer to
    pub id: String,
    /// Plugin instance id (generated when absent)
    #[serde(default)]
    pub instance_id: Option<String>,
    pub kind: KeychainKind,
    /// Base URL of the keychain endpoints (remote kind only)
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Initial entries (memory kind only)
    #[serde(default)]
    pub entries: Vec<KeychainEntryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeychainEntryConfig {
    pub key: String,
    pub value: String,
}

/// Settings shared by both HTLC plugins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtlcPluginConfig {
    /// Plugin instance id (generated when absent)
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Gas limit used when a request carries none
    #[serde(default = "default_estimated_gas")]
    pub estimated_gas: u64,
    /// Compiled contract artifact (ABI + bytecode); the embedded ABI is used
    /// when absent, which leaves `initialize` unavailable
    #[serde(default)]
    pub artifact_path: Option<String>,
}

impl Default for HtlcPluginConfig {
    fn default() -> Self {
        Self {
            instance_id: None,
            estimated_gas: DEFAULT_ESTIMATED_GAS,
            artifact_path: None,
        }
    }
}

/// Supply-chain plugin: shipments on Fabric, bookshelves and bamboo harvests
/// on web3 ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyChainConfig {
    #[serde(default)]
    pub instance_id: Option<String>,
    pub shipment: FabricContractConfig,
    pub bookshelf: Web3ContractConfig,
    pub bamboo_harvest: Web3ContractConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricContractConfig {
    pub connector_id: String,
    pub channel_name: String,
    pub chain_code_id: String,
    /// Keychain holding the Fabric identity
    pub keychain_id: String,
    pub keychain_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Web3ContractConfig {
    pub connector_id: String,
    pub contract_address: String,
    /// Contract artifact; the embedded repository ABI is used when absent
    #[serde(default)]
    pub artifact_path: Option<String>,
    /// Account that signs inserts, with its key held in a keychain the
    /// connector resolves itself
    pub eth_account: String,
    pub keychain_id: String,
    pub keychain_entry_key: String,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_estimated_gas() -> u64 {
    DEFAULT_ESTIMATED_GAS
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Loads configuration from the TOML file.
    ///
    /// This function:
    /// 1. Resolves the path from `INTEROP_NODE_CONFIG_PATH` (default `config/node.toml`)
    /// 2. If the file exists, loads it with `INTEROP_NODE__*` env overrides and validates it
    /// 3. If it doesn't exist, returns an error asking user to copy template
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - Failed to load configuration, file doesn't exist, or validation failed
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            Self::load_from_path(&config_path)
        } else {
            // Configuration file doesn't exist - user needs to copy template
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/node.template.toml config/node.toml\n\
                Then edit config/node.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Loads and validates configuration from `path`, applying env overrides.
    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(Path::new(path)).format(::config::FileFormat::Toml),
            )
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read configuration '{}': {}", path, e))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to parse configuration '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - Connector and keychain ids are non-blank and unique
    /// - Remote connectors and keychains carry a parseable URL
    /// - Dev ledger accounts and addresses are valid hex addresses
    /// - Supply-chain settings reference connectors of the right kind
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - First problem found
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut connector_ids = HashSet::new();
        for connector in &self.connectors {
            if connector.id.trim().is_empty() {
                anyhow::bail!("Configuration error: connector id must not be blank");
            }
            if !connector_ids.insert(connector.id.as_str()) {
                anyhow::bail!(
                    "Configuration error: duplicate connector id '{}'. Each connector must have a unique id.",
                    connector.id
                );
            }
            match connector.kind {
                ConnectorKind::Dev => {
                    if let Some(dev) = &connector.dev {
                        validate_dev_ledger(&connector.id, dev)?;
                    }
                }
                _ => validate_url(&format!("connector '{}'", connector.id), connector.url.as_deref())?,
            }
        }

        let mut keychain_ids = HashSet::new();
        for keychain in &self.keychains {
            if keychain.id.trim().is_empty() {
                anyhow::bail!("Configuration error: keychain id must not be blank");
            }
            if !keychain_ids.insert(keychain.id.as_str()) {
                anyhow::bail!(
                    "Configuration error: duplicate keychain id '{}'. Each keychain must have a unique id.",
                    keychain.id
                );
            }
            if keychain.kind == KeychainKind::Remote {
                validate_url(&format!("keychain '{}'", keychain.id), keychain.url.as_deref())?;
            }
        }

        for (name, htlc) in [("htlc", &self.htlc), ("htlc_erc20", &self.htlc_erc20)] {
            if htlc.estimated_gas == 0 {
                anyhow::bail!("Configuration error: {}.estimated_gas must be greater than zero", name);
            }
            if let Some(id) = &htlc.instance_id {
                if id.trim().is_empty() {
                    anyhow::bail!("Configuration error: {}.instance_id must not be blank", name);
                }
            }
        }

        if let Some(supply_chain) = &self.supply_chain {
            self.expect_connector(
                "supply_chain.shipment",
                &supply_chain.shipment.connector_id,
                &[ConnectorKind::Fabric],
            )?;
            for (name, contract) in [
                ("supply_chain.bookshelf", &supply_chain.bookshelf),
                ("supply_chain.bamboo_harvest", &supply_chain.bamboo_harvest),
            ] {
                self.expect_connector(
                    name,
                    &contract.connector_id,
                    &[ConnectorKind::Besu, ConnectorKind::Quorum, ConnectorKind::Dev],
                )?;
                validate_address(&format!("{}.contract_address", name), &contract.contract_address)?;
                validate_address(&format!("{}.eth_account", name), &contract.eth_account)?;
            }
        }

        Ok(())
    }

    /// Finds a connector by id.
    pub fn connector(&self, id: &str) -> Option<&ConnectorConfig> {
        self.connectors.iter().find(|c| c.id == id)
    }

    fn expect_connector(&self, setting: &str, id: &str, kinds: &[ConnectorKind]) -> anyhow::Result<()> {
        match self.connector(id) {
            None => anyhow::bail!("Configuration error: {} references unknown connector '{}'", setting, id),
            Some(c) if !kinds.contains(&c.kind) => anyhow::bail!(
                "Configuration error: {} references connector '{}' of kind {:?}, expected one of {:?}",
                setting,
                id,
                c.kind,
                kinds
            ),
            Some(_) => Ok(()),
        }
    }

    /// Creates a default configuration for local development.
    ///
    /// Registers one dev ledger and one empty in-memory keychain. HTLC
    /// deployment still needs contract artifacts.
    #[allow(dead_code)]
    pub fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
            },
            connectors: vec![ConnectorConfig {
                id: "dev-besu".to_string(),
                kind: ConnectorKind::Dev,
                url: None,
                timeout_ms: DEFAULT_TIMEOUT_MS,
                dev: Some(DevLedgerConfig::default()),
            }],
            keychains: vec![KeychainConfig {
                id: "dev-keychain".to_string(),
                instance_id: None,
                kind: KeychainKind::Memory,
                url: None,
                timeout_ms: DEFAULT_TIMEOUT_MS,
                entries: vec![],
            }],
            htlc: HtlcPluginConfig::default(),
            htlc_erc20: HtlcPluginConfig::default(),
            supply_chain: None,
        }
    }
}

fn validate_url(setting: &str, url: Option<&str>) -> anyhow::Result<()> {
    let url = url.ok_or_else(|| anyhow::anyhow!("Configuration error: {} requires a url", setting))?;
    url::Url::parse(url)
        .map_err(|e| anyhow::anyhow!("Configuration error: {} has invalid url '{}': {}", setting, url, e))?;
    Ok(())
}

fn validate_address(setting: &str, address: &str) -> anyhow::Result<()> {
    address
        .parse::<chain_clients_common::EvmAddress>()
        .map_err(|e| anyhow::anyhow!("Configuration error: {} is not an address: {}", setting, e))?;
    Ok(())
}

fn validate_dev_ledger(connector_id: &str, dev: &DevLedgerConfig) -> anyhow::Result<()> {
    for account in &dev.accounts {
        validate_address(&format!("connector '{}' account", connector_id), &account.address)?;
    }
    for predeploy in &dev.predeployed {
        validate_address(&format!("connector '{}' predeployed address", connector_id), &predeploy.address)?;
    }
    Ok(())
}
