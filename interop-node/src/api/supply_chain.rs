//! Routes of the supply-chain plugin (`/api/v1/plugins/supply-chain/`).

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use super::generic::{parse_body, plugin_reply};
use crate::supply_chain::{BambooHarvest, Bookshelf, Shipment, SupplyChainPlugin};

#[derive(Debug, Deserialize)]
struct InsertShipmentRequest {
    shipment: Shipment,
}

#[derive(Debug, Deserialize)]
struct InsertBookshelfRequest {
    bookshelf: Bookshelf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertBambooHarvestRequest {
    bamboo_harvest: BambooHarvest,
}

/// Injects the plugin, rejecting with 404 when it is not installed.
fn with_supply_chain(
    plugin: Option<Arc<SupplyChainPlugin>>,
) -> impl Filter<Extract = (Arc<SupplyChainPlugin>,), Error = Rejection> + Clone {
    warp::any().and_then(move || {
        let plugin = plugin.clone();
        async move { plugin.ok_or_else(warp::reject::not_found) }
    })
}

async fn insert_shipment_handler(body: Bytes, plugin: Arc<SupplyChainPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/supply-chain/insert-shipment";
    let request: InsertShipmentRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.insert_shipment(request.shipment).await))
}

async fn list_shipment_handler(plugin: Arc<SupplyChainPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "GET /api/v1/plugins/supply-chain/list-shipment";
    debug!("{}", tag);
    Ok(plugin_reply(tag, plugin.list_shipment().await))
}

async fn insert_bookshelf_handler(body: Bytes, plugin: Arc<SupplyChainPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/supply-chain/insert-bookshelf";
    let request: InsertBookshelfRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.insert_bookshelf(request.bookshelf).await))
}

async fn list_bookshelf_handler(plugin: Arc<SupplyChainPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "GET /api/v1/plugins/supply-chain/list-bookshelf";
    debug!("{}", tag);
    Ok(plugin_reply(tag, plugin.list_bookshelf().await))
}

async fn insert_bamboo_harvest_handler(
    body: Bytes,
    plugin: Arc<SupplyChainPlugin>,
) -> Result<impl Reply, Rejection> {
    let tag = "POST /api/v1/plugins/supply-chain/insert-bamboo-harvest";
    let request: InsertBambooHarvestRequest = parse_body(tag, &body)?;
    Ok(plugin_reply(tag, plugin.insert_bamboo_harvest(request.bamboo_harvest).await))
}

async fn list_bamboo_harvest_handler(plugin: Arc<SupplyChainPlugin>) -> Result<impl Reply, Rejection> {
    let tag = "GET /api/v1/plugins/supply-chain/list-bamboo-harvest";
    debug!("{}", tag);
    Ok(plugin_reply(tag, plugin.list_bamboo_harvest().await))
}

pub(super) fn routes(
    plugin: Option<Arc<SupplyChainPlugin>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let insert_shipment = warp::path!("api" / "v1" / "plugins" / "supply-chain" / "insert-shipment")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_supply_chain(plugin.clone()))
        .and_then(insert_shipment_handler);

    let list_shipment = warp::path!("api" / "v1" / "plugins" / "supply-chain" / "list-shipment")
        .and(warp::get())
        .and(with_supply_chain(plugin.clone()))
        .and_then(list_shipment_handler);

    let insert_bookshelf = warp::path!("api" / "v1" / "plugins" / "supply-chain" / "insert-bookshelf")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_supply_chain(plugin.clone()))
        .and_then(insert_bookshelf_handler);

    let list_bookshelf = warp::path!("api" / "v1" / "plugins" / "supply-chain" / "list-bookshelf")
        .and(warp::get())
        .and(with_supply_chain(plugin.clone()))
        .and_then(list_bookshelf_handler);

    let insert_bamboo_harvest =
        warp::path!("api" / "v1" / "plugins" / "supply-chain" / "insert-bamboo-harvest")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_supply_chain(plugin.clone()))
            .and_then(insert_bamboo_harvest_handler);

    let list_bamboo_harvest =
        warp::path!("api" / "v1" / "plugins" / "supply-chain" / "list-bamboo-harvest")
            .and(warp::get())
            .and(with_supply_chain(plugin))
            .and_then(list_bamboo_harvest_handler);

    insert_shipment
        .or(list_shipment)
        .or(insert_bookshelf)
        .or(list_bookshelf)
        .or(insert_bamboo_harvest)
        .or(list_bamboo_harvest)
}
