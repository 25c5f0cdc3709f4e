use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    File,
    Directory,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::File => f.write_str("file"),
            HandleKind::Directory => f.write_str("directory"),
        }
    }
}

/// Opaque persistable reference to a capability.
///
/// Only the backend that issued a token knows how to turn it back into a
/// handle. Two handles with equal tokens refer to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleToken(String);

impl HandleToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    Read,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet, a request may prompt the user
    Prompt,
}

/// Exclusive write stream. Nothing is visible until `close`, which replaces
/// the previous content of the file in one step.
#[async_trait]
pub trait WritableFile: Send {
    async fn write(&mut self, data: &[u8]) -> Result<(), FsError>;

    /// Commit the written bytes, replacing the file content
    async fn close(self: Box<Self>) -> Result<(), FsError>;

    /// Drop the written bytes and leave the file untouched
    async fn abort(self: Box<Self>) -> Result<(), FsError>;
}

#[async_trait]
pub trait FileHandle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn token(&self) -> HandleToken;

    async fn read_bytes(&self) -> Result<Vec<u8>, FsError>;

    /// Read the whole file as UTF-8. Invalid UTF-8 is reported as malformed content.
    async fn read_text(&self) -> Result<String, FsError> {
        let bytes = self.read_bytes().await?;
        String::from_utf8(bytes).map_err(|e| FsError::MalformedContent {
            name: self.name().to_string(),
            reason: e.to_string(),
        })
    }

    async fn create_writable(&self) -> Result<Box<dyn WritableFile>, FsError>;

    fn is_same_entry(&self, other: &dyn FileHandle) -> bool {
        self.token() == other.token()
    }
}

#[async_trait]
pub trait DirectoryHandle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn token(&self) -> HandleToken;

    /// Direct children, in whatever order the backend yields them
    async fn entries(&self) -> Result<Vec<EntryHandle>, FsError>;

    /// Open the named child file, creating it empty when `create` is set and it is absent
    async fn get_file(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>, FsError>;

    async fn get_directory(
        &self,
        name: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>, FsError>;

    /// Remove the named child. A non-empty directory requires `recursive`.
    async fn remove_entry(&self, name: &str, recursive: bool) -> Result<(), FsError>;

    async fn query_permission(&self, mode: PermissionMode) -> Result<Permission, FsError>;

    async fn request_permission(&self, mode: PermissionMode) -> Result<Permission, FsError>;

    fn is_same_entry(&self, other: &dyn DirectoryHandle) -> bool {
        self.token() == other.token()
    }
}

/// One child of a directory
#[derive(Debug, Clone)]
pub enum EntryHandle {
    File(Arc<dyn FileHandle>),
    Directory(Arc<dyn DirectoryHandle>),
}

impl EntryHandle {
    pub fn name(&self) -> &str {
        match self {
            EntryHandle::File(f) => f.name(),
            EntryHandle::Directory(d) => d.name(),
        }
    }

    pub fn kind(&self) -> HandleKind {
        match self {
            EntryHandle::File(_) => HandleKind::File,
            EntryHandle::Directory(_) => HandleKind::Directory,
        }
    }
}

/// Reject names that could escape the parent directory
pub fn validate_name(name: &str) -> Result<(), FsError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(FsError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Replace the content of `file` with `data` through a transient write stream
pub async fn replace_contents(file: &dyn FileHandle, data: &[u8]) -> Result<(), FsError> {
    let mut writable = file.create_writable().await?;
    if let Err(e) = writable.write(data).await {
        let _ = writable.abort().await;
        return Err(e);
    }
    writable.close().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("sketch.excalidraw").is_ok());
        assert!(validate_name(".hidden").is_ok());
        assert_eq!(validate_name(""), Err(FsError::InvalidName(String::new())));
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
    }

    #[test]
    fn test_token_serializes_as_plain_string() {
        let token = HandleToken::new("/tmp/drawings");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"/tmp/drawings\"");
        let back: HandleToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
