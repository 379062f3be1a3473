//! Unit tests for the Fabric connector HTTP client

use chain_clients_fabric::{
    ConnectorError, FabricConnector, FabricConnectorClient, FabricContractInvocationType,
    RunTransactionRequest,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUN_TRANSACTION_PATH: &str =
    "/api/v1/plugins/@hyperledger/cactus-plugin-ledger-connector-fabric/run-transaction";

fn insert_shipment_request() -> RunTransactionRequest {
    RunTransactionRequest {
        keychain_id: "kc-fabric".to_string(),
        keychain_ref: "user2".to_string(),
        channel_name: "mychannel".to_string(),
        chain_code_id: "shipment".to_string(),
        invocation_type: FabricContractInvocationType::Send,
        function_name: "insertShipment".to_string(),
        function_args: vec!["s1".to_string(), "b1".to_string()],
    }
}

/// Test that the request goes out with the connector's exact flat JSON shape
/// Why: The connector rejects nested credentials and unknown field names; the
/// invocation type wire values also carry the enum name as a prefix
#[tokio::test]
async fn test_run_transaction_wire_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_TRANSACTION_PATH))
        .and(body_json(json!({
            "keychainId": "kc-fabric",
            "keychainRef": "user2",
            "channelName": "mychannel",
            "chainCodeId": "shipment",
            "invocationType": "FabricContractInvocationType.SEND",
            "functionName": "insertShipment",
            "functionArgs": ["s1", "b1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "functionOutput": "",
            "transactionId": "tx-1"
        })))
        .mount(&mock_server)
        .await;

    let client = FabricConnectorClient::new("fabric-1", &mock_server.uri(), Duration::from_secs(5))
        .expect("Failed to create FabricConnectorClient");
    let response = client
        .run_transaction(insert_shipment_request())
        .await
        .expect("run_transaction should succeed");

    assert_eq!(response.function_output, "");
    assert_eq!(response.transaction_id.as_deref(), Some("tx-1"));
    assert_eq!(client.instance_id(), "fabric-1");
}

/// Test that a connector failure maps to ConnectorError::Status
#[tokio::test]
async fn test_run_transaction_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_TRANSACTION_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("endorsement failed"))
        .mount(&mock_server)
        .await;

    let client =
        FabricConnectorClient::new("fabric-1", &mock_server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.run_transaction(insert_shipment_request()).await.unwrap_err();

    assert_eq!(
        err,
        ConnectorError::Status {
            status: 500,
            body: "endorsement failed".to_string()
        }
    );
}

/// Test that CALL serializes with its prefixed wire value
#[test]
fn test_call_invocation_type_wire_value() {
    let value = serde_json::to_value(FabricContractInvocationType::Call).unwrap();
    assert_eq!(value, json!("FabricContractInvocationType.CALL"));
}

/// Test that the serialized request carries no nested credential object
#[test]
fn test_request_keychain_fields_top_level() {
    let value = serde_json::to_value(insert_shipment_request()).unwrap();
    let fields = value.as_object().unwrap();

    for field in ["keychainId", "keychainRef", "chainCodeId", "functionName", "functionArgs"] {
        assert!(fields.contains_key(field), "request should carry {}", field);
    }
    assert!(!fields.contains_key("signingCredential"));
    assert!(!fields.contains_key("contractName"));
}
