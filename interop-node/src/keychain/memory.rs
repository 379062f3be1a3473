use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Keychain, KeychainError};

/// In-process keychain backed by a map, seeded from configuration.
pub struct MemoryKeychain {
    keychain_id: String,
    instance_id: String,
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeychain {
    pub fn new(keychain_id: &str, instance_id: &str) -> Self {
        Self::with_entries(keychain_id, instance_id, HashMap::new())
    }

    pub fn with_entries(
        keychain_id: &str,
        instance_id: &str,
        entries: HashMap<String, String>,
    ) -> Self {
        Self {
            keychain_id: keychain_id.to_string(),
            instance_id: instance_id.to_string(),
            entries: RwLock::new(entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl Keychain for MemoryKeychain {
    fn keychain_id(&self) -> &str {
        &self.keychain_id
    }

    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn get(&self, key: &str) -> Result<String, KeychainError> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| KeychainError::KeyNotFound {
                keychain_id: self.keychain_id.clone(),
                key: key.to_string(),
            })
    }

    async fn has(&self, key: &str) -> Result<bool, KeychainError> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!("keychain {}: set '{}'", self.keychain_id, key);
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeychainError> {
        debug!("keychain {}: delete '{}'", self.keychain_id, key);
        self.entries.write().await.remove(key);
        Ok(())
    }
}
