//! Routes of the ERC-20 HTLC plugin (`/api/v1/plugins/htlc-eth-besu-erc20/`).
//!
//! Every route takes a JSON body carrying the signing credential.

use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use super::generic::{parse_body, plugin_reply, with_plugin};
use crate::htlc::{
    Erc20InitializeRequest, Erc20NewContractRequest, Erc20RefundRequest, Erc20StatusRequest,
    Erc20WithdrawRequest, HtlcErc20Plugin,
};

async fn initialize_handler(body: Bytes, plugin: Arc<HtlcErc20Plugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu-erc20/initialize";
    let request: Erc20InitializeRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.initialize(request).await))
}

async fn new_contract_handler(body: Bytes, plugin: Arc<HtlcErc20Plugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu-erc20/new-contract";
    let request: Erc20NewContractRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.new_contract(request).await))
}

async fn refund_handler(body: Bytes, plugin: Arc<HtlcErc20Plugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu-erc20/refund";
    let request: Erc20RefundRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.refund(request).await))
}

async fn withdraw_handler(body: Bytes, plugin: Arc<HtlcErc20Plugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu-erc20/withdraw";
    let request: Erc20WithdrawRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.withdraw(request).await))
}

async fn get_status_handler(body: Bytes, plugin: Arc<HtlcErc20Plugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu-erc20/get-status";
    let request: Erc20StatusRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.get_status(request).await))
}

async fn get_single_status_handler(body: Bytes, plugin: Arc<HtlcErc20Plugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/htlc-eth-besu-erc20/get-single-status";
    let request: Erc20StatusRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.get_single_status(request).await))
}

pub(super) fn routes(
    plugin: Arc<HtlcErc20Plugin>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let initialize = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu-erc20" / "initialize")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(initialize_handler);

    let new_contract = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu-erc20" / "new-contract")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(new_contract_handler);

    let refund = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu-erc20" / "refund")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(refund_handler);

    let withdraw = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu-erc20" / "withdraw")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(withdraw_handler);

    let get_status = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu-erc20" / "get-status")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin.clone()))
        .and_then(get_status_handler);

    let get_single_status = warp::path!("api" / "v1" / "plugins" / "htlc-eth-besu-erc20" / "get-single-status")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_plugin(plugin))
        .and_then(get_single_status_handler);

    initialize
        .or(new_contract)
        .or(refund)
        .or(withdraw)
        .or(get_status)
        .or(get_single_status)
}
