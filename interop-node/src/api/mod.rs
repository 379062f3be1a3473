//! REST API Server Module
//!
//! Exposes the installed plugins over HTTP. Each plugin mounts its routes
//! under `/api/v1/plugins/<package-name>/`.

// Generic shared code (envelope, rejections, health, plugin list, server)
mod generic;

mod htlc_erc20;
mod htlc_eth;
mod supply_chain;

pub use generic::{ApiServer, NodePlugins};
// Re-export ApiResponse for testing
#[allow(unused_imports)]
pub use generic::ApiResponse;
