use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use sketchdir_platform::handle::{DirectoryHandle, HandleToken};
use sketchdir_platform::{DirectoryPicker, FsError};

use crate::filesystem::LocalDirectory;

/// Picker whose "user choice" is a path supplied up front, e.g. from the
/// command line. No path means the user made no choice.
pub struct PathPicker {
    choice: Option<PathBuf>,
}

impl PathPicker {
    pub fn new(choice: Option<PathBuf>) -> Self {
        Self { choice }
    }
}

#[async_trait]
impl DirectoryPicker for PathPicker {
    async fn pick(&self) -> Result<Option<Arc<dyn DirectoryHandle>>, FsError> {
        let Some(path) = &self.choice else {
            return Ok(None);
        };
        info!("picked directory {}", path.display());
        let dir = LocalDirectory::open(path).await?;
        Ok(Some(Arc::new(dir)))
    }

    async fn resolve(&self, token: &HandleToken) -> Result<Arc<dyn DirectoryHandle>, FsError> {
        let dir = LocalDirectory::open(token.as_str()).await?;
        Ok(Arc::new(dir))
    }
}
