use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::key::StorageKey;
use crate::store::CredentialStore;

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: String) -> Result<()> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.entries.write().await.remove(&key);
        Ok(())
    }
}
