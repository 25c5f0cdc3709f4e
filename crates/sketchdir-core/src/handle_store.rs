use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use sketchdir_platform::handle::HandleToken;
use sketchdir_platform::KeyValueStore;

/// Key under which the last opened directory is remembered
pub const LAST_DIRECTORY_KEY: &str = "lastDirectory";

/// Remembers the token of the last opened directory across restarts
#[derive(Clone)]
pub struct HandleStore {
    store: Arc<dyn KeyValueStore>,
}

impl HandleStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, token: &HandleToken) -> Result<()> {
        let value = serde_json::to_value(token)?;
        self.store
            .set(LAST_DIRECTORY_KEY, value)
            .await
            .context("failed to persist directory handle")?;
        debug!("remembered directory {}", token.as_str());
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<HandleToken>> {
        let Some(value) = self.store.get(LAST_DIRECTORY_KEY).await? else {
            return Ok(None);
        };
        let token = serde_json::from_value(value).context("stored directory handle is invalid")?;
        Ok(Some(token))
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(LAST_DIRECTORY_KEY).await
    }
}
