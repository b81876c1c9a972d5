use async_trait::async_trait;
use crate::application::errors::StorageError;

/// Store trait - opaque key/value persistence used by feature handlers
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// All (key, value) pairs whose key starts with `prefix`, ordered by key
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError>;
}
