use crate::core::Result;

use async_trait::async_trait;

/// Key-value store the migrator records versions in.
///
/// Addressed by string keys and expected to persist across restarts for
/// anything beyond tests. Backend errors are returned as-is; the migrator
/// never reinterprets them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
