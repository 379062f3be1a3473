//! Generic API structures and handlers
//!
//! Shared response envelope, rejection handling, filter helpers and the API
//! server that mounts the routes of every installed plugin.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::config::Config;
use crate::dev_ledger::{Clock, SystemClock};
use crate::htlc::{HtlcErc20Plugin, HtlcEthPlugin};
use crate::plugin::{Plugin, PluginError, PluginInfo};
use crate::registry::PluginRegistry;
use crate::supply_chain::SupplyChainPlugin;

// ============================================================================
// SHARED REQUEST/RESPONSE STRUCTURES
// ============================================================================

/// Standardized response structure for all API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Converts a plugin result into an HTTP reply.
///
/// Failures are logged at error level under `tag` (`VERB path`) and answered
/// with the status [`PluginError::http_status`] maps them to.
pub fn plugin_reply<T: Serialize>(
    tag: &str,
    result: std::result::Result<T, PluginError>,
) -> warp::reply::WithStatus<warp::reply::Json> {
    match result {
        Ok(data) => warp::reply::with_status(
            warp::reply::json(&ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
            StatusCode::OK,
        ),
        Err(e) => {
            error!("{} failed: {}", tag, e);
            let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warp::reply::with_status(
                warp::reply::json(&ApiResponse::<()> {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }),
                status,
            )
        }
    }
}

/// Deserializes a JSON request body, rejecting with a 400 on failure.
pub fn parse_body<T: DeserializeOwned>(tag: &str, body: &Bytes) -> std::result::Result<T, Rejection> {
    let body_str = String::from_utf8_lossy(body);
    debug!("{} - Received body: {}", tag, body_str);

    serde_json::from_slice::<T>(body).map_err(|e| {
        error!("{} deserialization failed: {}. Body: {}", tag, e, body_str);
        warp::reject::custom(JsonDeserializeError(format!("Invalid JSON: {}", e)))
    })
}

// ============================================================================
// GENERIC API HANDLERS
// ============================================================================

/// Handler for the installed-plugins endpoint.
pub async fn list_plugins_handler(
    plugins: Arc<Vec<PluginInfo>>,
) -> std::result::Result<impl warp::Reply, warp::Rejection> {
    debug!("GET /api/v1/plugins");
    Ok(warp::reply::json(&ApiResponse {
        success: true,
        data: Some(plugins.as_ref().clone()),
        error: None,
    }))
}

// ============================================================================
// WARP FILTER HELPERS
// ============================================================================

/// Creates a warp filter that injects a shared plugin into request handlers.
///
/// # Arguments
///
/// * `plugin` - The plugin instance
///
/// # Returns
///
/// A warp filter that provides the plugin to handlers
pub fn with_plugin<P: Send + Sync + ?Sized>(
    plugin: Arc<P>,
) -> impl Filter<Extract = (Arc<P>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || plugin.clone())
}

// ============================================================================
// CUSTOM REJECTION TYPES
// ============================================================================

/// Custom rejection for JSON deserialization errors
#[derive(Debug)]
pub struct JsonDeserializeError(pub String);

impl warp::reject::Reject for JsonDeserializeError {}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Global rejection handler for all API routes.
///
/// This function handles all warp rejections and converts them into
/// standardized API responses with appropriate HTTP status codes.
///
/// # Arguments
///
/// * `rej` - The warp rejection to handle
///
/// # Returns
///
/// A warp reply with an error response
pub async fn handle_rejection(rej: Rejection) -> std::result::Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if let Some(err) = rej.find::<JsonDeserializeError>() {
        (StatusCode::BAD_REQUEST, err.0.clone())
    } else if let Some(err) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", err))
    } else if let Some(err) = rej.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, format!("Invalid query string: {}", err))
    } else if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
        status,
    ))
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// The plugins the API serves.
#[derive(Clone)]
pub struct NodePlugins {
    pub htlc: Arc<HtlcEthPlugin>,
    pub htlc_erc20: Arc<HtlcErc20Plugin>,
    /// Supply-chain routes answer 404 without it
    pub supply_chain: Option<Arc<SupplyChainPlugin>>,
}

impl NodePlugins {
    /// Builds every plugin `config` describes over `registry`.
    pub fn from_config(config: &Config, registry: Arc<PluginRegistry>) -> Result<Self> {
        let htlc = HtlcEthPlugin::from_config(&config.htlc, registry.clone())
            .context("Failed to create HTLC plugin")?;
        let htlc_erc20 = HtlcErc20Plugin::from_config(&config.htlc_erc20, registry.clone())
            .context("Failed to create HTLC ERC-20 plugin")?;
        let supply_chain = match &config.supply_chain {
            Some(supply_chain) => Some(Arc::new(
                SupplyChainPlugin::from_config(supply_chain, registry)
                    .context("Failed to create supply-chain plugin")?,
            )),
            None => None,
        };
        Ok(Self {
            htlc: Arc::new(htlc),
            htlc_erc20: Arc::new(htlc_erc20),
            supply_chain,
        })
    }

    pub fn infos(&self) -> Vec<PluginInfo> {
        let mut infos = vec![self.htlc.info(), self.htlc_erc20.info()];
        if let Some(supply_chain) = &self.supply_chain {
            infos.push(supply_chain.info());
        }
        infos
    }
}

/// REST API server of the interop node.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    plugins: NodePlugins,
}

impl ApiServer {
    /// Creates a new API server serving `plugins`.
    pub fn new(config: Config, plugins: NodePlugins) -> Self {
        Self {
            config: Arc::new(config),
            plugins,
        }
    }

    /// Builds the registry and plugins described by `config`, with dev
    /// ledgers on the system clock.
    pub fn from_config(config: Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::from_config_with_clock(config, clock)
    }

    pub fn from_config_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let registry = Arc::new(PluginRegistry::from_config(&config, clock)?);
        let plugins = NodePlugins::from_config(&config, registry)?;
        Ok(Self::new(config, plugins))
    }

    pub fn plugins(&self) -> &NodePlugins {
        &self.plugins
    }

    /// Starts the API server and begins handling HTTP requests.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server started successfully
    /// * `Err(anyhow::Error)` - Failed to start server
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );

        // Create and configure all API routes
        let routes = self.create_routes();

        // Parse host address from config
        let addr: std::net::SocketAddr = format!("{}:{}", self.config.api.host, self.config.api.port)
            .parse()
            .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    ///
    /// # Returns
    ///
    /// A warp filter containing all API routes
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        use super::{htlc_erc20, htlc_eth, supply_chain};

        // Health check endpoint - returns service status
        let health = warp::path("health").and(warp::get()).map(|| {
            warp::reply::json(&ApiResponse::<String> {
                success: true,
                data: Some("Interop node is running".to_string()),
                error: None,
            })
        });

        // Installed plugin metadata
        let infos = Arc::new(self.plugins.infos());
        let plugins = warp::path!("api" / "v1" / "plugins")
            .and(warp::get())
            .and(warp::any().map(move || infos.clone()))
            .and_then(list_plugins_handler);

        // Combine all routes and apply rejection handler
        health
            .or(plugins)
            .or(htlc_eth::routes(self.plugins.htlc.clone()))
            .or(htlc_erc20::routes(self.plugins.htlc_erc20.clone()))
            .or(supply_chain::routes(self.plugins.supply_chain.clone()))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    #[allow(dead_code)] // Used by tests
    pub fn test_routes(&self) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}
