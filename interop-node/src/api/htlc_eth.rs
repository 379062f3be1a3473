//! Routes of the native-value HTLC plugin (`/api/v1/plugins/htlc-eth-besu/`).

use chain_clients_evm::Web3SigningCredentialType;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use super::generic::{parse_body, plugin_reply, with_plugin, JsonDeserializeError};
use crate::htlc::{
    HtlcEthPlugin, InitializeRequest, NewContractRequest, RefundRequest, StatusQuery,
    WithdrawRequest,
};

// ============================================================================
// QUERY PARSING
// ============================================================================

fn reject(message: String) -> Rejection {
    warp::reject::custom(JsonDeserializeError(message))
}

/// Parses the query string of the status endpoints.
///
/// `ids` is a comma-separated list and only read by `get-status`.
fn parse_status_query(query: &str) -> Result<(Vec<String>, StatusQuery), Rejection> {
    let parsed = url::Url::parse(&format!("http://dummy?{}", query))
        .map_err(|e| reject(format!("Invalid query string: {}", e)))?;
    let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

    let param = |name: &str| {
        params
            .get(name)
            .cloned()
            .ok_or_else(|| reject(format!("Missing {} parameter", name)))
    };

    let credential_type = param("credentialType")?
        .parse::<Web3SigningCredentialType>()
        .map_err(|e| reject(format!("Invalid credentialType: {}", e)))?;
    let ids = params
        .get("ids")
        .map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Ok((
        ids,
        StatusQuery {
            contract_address: param("contractAddress")?,
            connector_id: param("connectorId")?,
            keychain_id: param("keychainId")?,
            account_ref: param("accountRef")?,
            private_key_ref: param("privateKeyRef")?,
            credential_type,
        },
    ))
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn initialize_handler(body: Bytes, plugin: Arc<HtlcEthPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu/initialize";
    let request: InitializeRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.initialize(request).await))
}

async fn new_contract_handler(body: Bytes, plugin: Arc<HtlcEthPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu/new-contract";
    let request: NewContractRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.new_contract(request).await))
}

async fn refund_handler(id: String, body: Bytes, plugin: Arc<HtlcEthPlugin>) -> Result<impl Reply, Rejection> {
    let tag = format!("POST /api/v1/plugins/htlc-eth-besu/refund/{}", id);
    let request: RefundRequest = parse_body(&tag, &body)?;
    Ok(plugin_reply(&tag, plugin.refund(&id, request).await))
}

async fn withdraw_handler(body: Bytes, plugin: Arc<HtlcEthPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu/withdraw";
    let request: WithdrawRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.withdraw(request).await))
}

async fn get_status_handler(query: String, plugin: Arc<HtlcEthPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "GET /api/v1/plugins/htlc-eth-besu/get-status";
    debug!("{}", tag);
    let (ids, query) = parse_status_query(&query)?;
    Ok(plugin_reply(tag, plugin.get_status(&ids, query).await))
}

async fn get_single_status_handler(
    id: String,
    query: String,
    plugin: Arc<HtlcEthPlugin>,
) -> Result<impl Reply, Rejection> {
    let tag = format!("GET /api/v1/plugins/htlc-eth-besu/get-single-status/{}", id);
    debug!("{}", tag);
    let (_, query) = parse_status_query(&query)?;
    Ok(plugin_reply(&tag, plugin.get_single_status(&id, query).await))
}

// ============================================================================
// ROUTES
// ============================================================================

pub(super) fn routes(
    plugin: Arc<HtlcEthPlugin>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let initialize = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu" / "initialize")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(initialize_handler);

    let new_contract = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu" / "new-contract")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(new_contract_handler);

    let refund = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu" / "refund" / String)
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(refund_handler);

    let withdraw = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu" / "withdraw")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(withdraw_handler);

    let get_status = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu" / "get-status")
        .and(warp::get())
        .and(warp::query::raw())
        .and(with_plugin(plugin.clone()))
        .and_then(get_status_handler);

    let get_single_status =
        warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu" / "get-single-status" / String)
            .and(warp::get())
            .and(warp::query::raw())
            .and(with_plugin(plugin))
            .and_then(get_single_status_handler);

    initialize
        .or(new_contract)
        .or(refund)
        .or(withdraw)
        .or(get_status)
        .or(get_single_status)
}
