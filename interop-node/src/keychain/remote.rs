//! Client for a keychain exposed by another node over HTTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Keychain, KeychainError};

#[derive(Debug, Serialize)]
struct KeyRequest<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct SetRequest<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HasResponse {
    is_present: bool,
    #[serde(default)]
    checked_at: Option<DateTime<Utc>>,
}

pub struct RemoteKeychain {
    client: Client,
    /// Base URL of the keychain plugin's endpoints (entries are addressed as
    /// `{base_url}/get-keychain-entry` etc.)
    base_url: String,
    keychain_id: String,
    instance_id: String,
}

impl RemoteKeychain {
    /// Creates a client for the keychain at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `keychain_id` - Keychain id requests refer to
    /// * `instance_id` - Plugin instance id
    /// * `base_url` - Base URL of the keychain endpoints
    /// * `timeout` - Per-request timeout
    pub fn new(
        keychain_id: &str,
        instance_id: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, KeychainError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| KeychainError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            keychain_id: keychain_id.to_string(),
            instance_id: instance_id.to_string(),
        })
    }

    async fn send<B: Serialize>(
        &self,
        url: &str,
        key: &str,
        body: &B,
    ) -> Result<reqwest::Response, KeychainError> {
        debug!("POST {} (key '{}')", url, key);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| KeychainError::Transport(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(KeychainError::KeyNotFound {
                keychain_id: self.keychain_id.clone(),
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeychainError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        key: &str,
        body: &B,
    ) -> Result<R, KeychainError> {
        let url = format!("{}/{}", self.base_url, operation);
        self.send(&url, key, body)
            .await?
            .json::<R>()
            .await
            .map_err(|e| KeychainError::Decode(format!("{}: {}", url, e)))
    }

    /// Posts an operation whose response body carries nothing we need.
    async fn post_ignoring_body<B: Serialize>(
        &self,
        operation: &str,
        key: &str,
        body: &B,
    ) -> Result<(), KeychainError> {
        let url = format!("{}/{}", self.base_url, operation);
        self.send(&url, key, body).await.map(|_| ())
    }
}

#[async_trait]
impl Keychain for RemoteKeychain {
    fn keychain_id(&self) -> &str {
        &self.keychain_id
    }

    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn get(&self, key: &str) -> Result<String, KeychainError> {
        let response: GetResponse = self
            .post("get-keychain-entry", key, &KeyRequest { key })
            .await?;
        Ok(response.value)
    }

    async fn has(&self, key: &str) -> Result<bool, KeychainError> {
        let response: HasResponse = self
            .post("has-keychain-entry", key, &KeyRequest { key })
            .await?;
        if let Some(checked_at) = response.checked_at {
            debug!("keychain {}: '{}' checked at {}", self.keychain_id, key, checked_at);
        }
        Ok(response.is_present)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        self.post_ignoring_body("set-keychain-entry", key, &SetRequest { key, value })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), KeychainError> {
        self.post_ignoring_body("delete-keychain-entry", key, &KeyRequest { key })
            .await
    }
}
