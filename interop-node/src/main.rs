//! Interop Node
//!
//! Serves the HTLC plugins (native value and ERC-20) and the supply-chain
//! business-logic plugin over HTTP, forwarding every operation to the ledger
//! connectors named in the configuration.

use anyhow::Result;
use tracing::info;

use interop_node::api::ApiServer;
use interop_node::config::{Config, CONFIG_PATH_ENV};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Registers connectors and keychains, creates the plugins
/// 4. Starts the API server
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting Interop Node");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Interop Node");
        println!();
        println!("Usage: interop-node [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <path>   Use custom config file path");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  INTEROP_NODE_CONFIG_PATH   Path to config file (default: config/node.toml)");
        println!("  INTEROP_NODE__<SECTION>__<KEY>   Override a single setting, e.g. INTEROP_NODE__API__PORT");
        return Ok(());
    }

    // Check for custom config path
    let mut config_path = None;
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            break;
        }
    }

    if let Some(path) = config_path {
        std::env::set_var(CONFIG_PATH_ENV, &path);
        info!("Using custom config: {}", path);
    }

    // Load configuration from config file (or INTEROP_NODE_CONFIG_PATH env var)
    let config = Config::load()?;
    info!("Configuration loaded successfully");

    let api_server = ApiServer::from_config(config)?;
    for plugin in api_server.plugins().infos() {
        info!(
            "Installed plugin {} ({:?}) as {}",
            plugin.package_name, plugin.aspect, plugin.instance_id
        );
    }

    // Run the service (this blocks until shutdown)
    api_server.run().await?;

    Ok(())
}
