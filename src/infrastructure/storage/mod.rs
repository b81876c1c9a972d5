//! Key/value storage used by feature handlers

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::traits::Store;

/// In-memory store, optionally snapshotted to a JSON file on every write
pub struct MemoryStore {
    path: Option<PathBuf>,
    kv: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            path: None,
            kv: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load an existing snapshot (if any) and keep it up to date
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let kv = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            path: Some(path),
            kv: RwLock::new(kv),
        })
    }

    async fn persist(&self, kv: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(kv)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.insert(key.to_string(), value.to_string());
        self.persist(&kv).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.remove(key);
        self.persist(&kv).await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_returns_prefixed_keys_in_order() {
        let store = MemoryStore::new();
        store.set("quote:2", "b").await.unwrap();
        store.set("quote:1", "a").await.unwrap();
        store.set("warn:1", "x").await.unwrap();

        let quotes = store.scan("quote:").await.unwrap();
        assert_eq!(
            quotes,
            vec![("quote:1".to_string(), "a".to_string()), ("quote:2".to_string(), "b".to_string())]
        );
        store.delete("quote:1").await.unwrap();
        assert_eq!(store.get("quote:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let path = std::env::temp_dir().join(format!("sentinel-store-{}.json", uuid::Uuid::new_v4()));
        {
            let store = MemoryStore::open(&path).await.unwrap();
            store.set("k", "v").await.unwrap();
        }
        let reopened = MemoryStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some("v".to_string()));
        let _ = std::fs::remove_file(&path);
    }
}
