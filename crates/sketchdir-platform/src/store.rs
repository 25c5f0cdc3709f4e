use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Small persistent key-value store that survives application restarts
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
