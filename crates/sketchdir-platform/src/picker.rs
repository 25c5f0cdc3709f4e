use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FsError;
use crate::handle::{DirectoryHandle, HandleToken};

/// Source of directory capabilities, gated by user consent
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    /// Ask the user for a directory. `Ok(None)` means the prompt was dismissed.
    async fn pick(&self) -> Result<Option<Arc<dyn DirectoryHandle>>, FsError>;

    /// Turn a previously issued token back into a handle. Permission is not
    /// checked here; callers query it on the returned handle.
    async fn resolve(&self, token: &HandleToken) -> Result<Arc<dyn DirectoryHandle>, FsError>;
}
