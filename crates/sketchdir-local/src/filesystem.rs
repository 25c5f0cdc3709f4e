use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use sketchdir_platform::handle::{
    validate_name, DirectoryHandle, EntryHandle, FileHandle, HandleKind, HandleToken, Permission,
    PermissionMode, WritableFile,
};
use sketchdir_platform::FsError;

/// Directory capability backed by a local path
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

/// File capability backed by a local path
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    /// Open an existing directory. The path is canonicalized so that two
    /// handles to the same location compare equal.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let canonical = fs::canonicalize(path)
            .await
            .map_err(|e| map_io("open directory", &display, e))?;
        let meta = fs::metadata(&canonical)
            .await
            .map_err(|e| map_io("open directory", &display, e))?;
        if !meta.is_dir() {
            return Err(FsError::TypeMismatch {
                name: display,
                expected: HandleKind::Directory,
            });
        }
        Ok(Self::at(canonical))
    }

    fn at(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn child(&self, name: &str) -> Result<PathBuf, FsError> {
        validate_name(name)?;
        Ok(self.path.join(name))
    }
}

impl LocalFile {
    fn at(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn token(&self) -> HandleToken {
        HandleToken::new(self.path.to_string_lossy())
    }

    async fn entries(&self) -> Result<Vec<EntryHandle>, FsError> {
        let mut dir = fs::read_dir(&self.path)
            .await
            .map_err(|e| map_io("read directory", &self.name, e))?;

        let mut result = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| map_io("read directory", &self.name, e))?
        {
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            // linked files are listed, linked folders are not walked (they may loop)
            let meta = if file_type.is_symlink() {
                match fs::metadata(&path).await {
                    Ok(m) if m.is_dir() => {
                        tracing::debug!("not following directory link {}", path.display());
                        continue;
                    }
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("skipping {}: {}", path.display(), e);
                        continue;
                    }
                }
            } else {
                match entry.metadata().await {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("skipping {}: {}", path.display(), e);
                        continue;
                    }
                }
            };

            if meta.is_dir() {
                result.push(EntryHandle::Directory(Arc::new(LocalDirectory::at(path))));
            } else if meta.is_file() {
                result.push(EntryHandle::File(Arc::new(LocalFile::at(path))));
            }
        }

        Ok(result)
    }

    async fn get_file(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>, FsError> {
        let path = self.child(name)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Err(FsError::TypeMismatch {
                name: name.to_string(),
                expected: HandleKind::File,
            }),
            Ok(_) => Ok(Arc::new(LocalFile::at(path))),
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&path)
                    .await
                    .map_err(|e| map_io("create file", name, e))?;
                Ok(Arc::new(LocalFile::at(path)))
            }
            Err(e) => Err(map_io("open file", name, e)),
        }
    }

    async fn get_directory(
        &self,
        name: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>, FsError> {
        let path = self.child(name)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Arc::new(LocalDirectory::at(path))),
            Ok(_) => Err(FsError::TypeMismatch {
                name: name.to_string(),
                expected: HandleKind::Directory,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                match fs::create_dir(&path).await {
                    Ok(()) => {}
                    // lost a race with another creator, which is fine
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(map_io("create directory", name, e)),
                }
                Ok(Arc::new(LocalDirectory::at(path)))
            }
            Err(e) => Err(map_io("open directory", name, e)),
        }
    }

    async fn remove_entry(&self, name: &str, recursive: bool) -> Result<(), FsError> {
        let path = self.child(name)?;
        let meta = fs::symlink_metadata(&path)
            .await
            .map_err(|e| map_io("remove", name, e))?;

        if meta.is_dir() {
            if recursive {
                fs::remove_dir_all(&path)
                    .await
                    .map_err(|e| map_io("remove directory", name, e))
            } else {
                let mut children = fs::read_dir(&path)
                    .await
                    .map_err(|e| map_io("remove directory", name, e))?;
                let has_children = children
                    .next_entry()
                    .await
                    .map_err(|e| map_io("remove directory", name, e))?
                    .is_some();
                if has_children {
                    return Err(FsError::NotEmpty(name.to_string()));
                }
                fs::remove_dir(&path)
                    .await
                    .map_err(|e| map_io("remove directory", name, e))
            }
        } else {
            fs::remove_file(&path)
                .await
                .map_err(|e| map_io("remove file", name, e))
        }
    }

    async fn query_permission(&self, mode: PermissionMode) -> Result<Permission, FsError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => {
                if mode == PermissionMode::ReadWrite && meta.permissions().readonly() {
                    Ok(Permission::Denied)
                } else {
                    Ok(Permission::Granted)
                }
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(Permission::Denied),
            Err(e) => Err(map_io("query permission", &self.name, e)),
        }
    }

    async fn request_permission(&self, mode: PermissionMode) -> Result<Permission, FsError> {
        // consent on a local path is given when the path is chosen; nothing to prompt for
        self.query_permission(mode).await
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn token(&self) -> HandleToken {
        HandleToken::new(self.path.to_string_lossy())
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, FsError> {
        fs::read(&self.path)
            .await
            .map_err(|e| map_io("read file", &self.name, e))
    }

    async fn create_writable(&self) -> Result<Box<dyn WritableFile>, FsError> {
        let meta = fs::metadata(&self.path)
            .await
            .map_err(|e| map_io("open for write", &self.name, e))?;
        if meta.is_dir() {
            return Err(FsError::TypeMismatch {
                name: self.name.clone(),
                expected: HandleKind::File,
            });
        }

        let parent = self
            .path
            .parent()
            .ok_or_else(|| FsError::InvalidName(self.name.clone()))?;
        // leading dot keeps the scratch file out of directory scans
        let temp = parent.join(format!(".{}.{}.tmp", self.name, uuid::Uuid::new_v4()));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)
            .await
            .map_err(|e| map_io("open for write", &self.name, e))?;

        Ok(Box::new(LocalWritable {
            target: self.path.clone(),
            name: self.name.clone(),
            temp,
            file: Some(file),
        }))
    }
}

/// Writes into a sibling scratch file and renames it over the target on close
pub struct LocalWritable {
    target: PathBuf,
    name: String,
    temp: PathBuf,
    file: Option<fs::File>,
}

#[async_trait]
impl WritableFile for LocalWritable {
    async fn write(&mut self, data: &[u8]) -> Result<(), FsError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| FsError::io("write", "stream already closed"))?;
        file.write_all(data)
            .await
            .map_err(|e| map_io("write", &self.name, e))
    }

    async fn close(self: Box<Self>) -> Result<(), FsError> {
        let mut this = self;
        let mut file = this
            .file
            .take()
            .ok_or_else(|| FsError::io("close", "stream already closed"))?;
        file.flush().await.map_err(|e| map_io("close", &this.name, e))?;
        file.sync_all()
            .await
            .map_err(|e| map_io("close", &this.name, e))?;
        drop(file);

        if let Err(e) = fs::rename(&this.temp, &this.target).await {
            let _ = fs::remove_file(&this.temp).await;
            return Err(map_io("close", &this.name, e));
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<(), FsError> {
        let mut this = self;
        this.file.take();
        fs::remove_file(&this.temp)
            .await
            .map_err(|e| map_io("abort", &this.name, e))
    }
}

impl Drop for LocalWritable {
    fn drop(&mut self) {
        // dropped without close or abort
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.temp);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn map_io(op: &'static str, name: &str, err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(name.to_string()),
        io::ErrorKind::PermissionDenied => FsError::PermissionDenied(name.to_string()),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(name.to_string()),
        _ => FsError::io(op, err),
    }
}
