//! Commands addressed by node id, so front ends never hold capabilities.

use std::sync::Arc;

use sketchdir_platform::handle::{DirectoryHandle, FileHandle};

use crate::context::{ContextError, FileSystemContext, MoveOutcome};
use crate::tree::{base_name, join_id, NodeId, TreeSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenDirectory,
    RestoreDirectory,
    Refresh,
    Select(Option<NodeId>),
    /// `parent` is a directory id, `""` for the root
    CreateFile { parent: NodeId, name: String },
    CreateFolder { parent: NodeId, name: String },
    Delete { node: NodeId },
    Move { node: NodeId, destination: NodeId },
}

#[derive(Debug)]
pub enum CommandOutcome {
    /// `false` when the user dismissed the picker
    Opened(bool),
    Restored(bool),
    Refreshed,
    Selected(Option<Arc<dyn FileHandle>>),
    Created(NodeId),
    Deleted(NodeId),
    Moved(MoveOutcome),
}

impl FileSystemContext {
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome, ContextError> {
        match command {
            Command::OpenDirectory => Ok(CommandOutcome::Opened(self.open_directory().await?)),
            Command::RestoreDirectory => Ok(CommandOutcome::Restored(self.restore_directory().await)),
            Command::Refresh => {
                self.refresh_directory().await?;
                Ok(CommandOutcome::Refreshed)
            }
            Command::Select(id) => Ok(CommandOutcome::Selected(self.select(id.as_deref())?)),
            Command::CreateFile { parent, name } => {
                let dir = require_directory(self.snapshot(), &parent)?;
                let file = self.create_file(&dir, &name).await?;
                Ok(CommandOutcome::Created(join_id(&parent, file.name())))
            }
            Command::CreateFolder { parent, name } => {
                let dir = require_directory(self.snapshot(), &parent)?;
                let created = self.create_folder(&dir, &name).await?;
                Ok(CommandOutcome::Created(join_id(&parent, created.name())))
            }
            Command::Delete { node } => {
                let snapshot = self.snapshot().ok_or(ContextError::NoDirectoryOpen)?;
                if !snapshot.contains(&node) {
                    return Err(ContextError::UnknownNode(node));
                }
                let parent = snapshot
                    .parent_directory(&node)
                    .ok_or_else(|| ContextError::UnknownNode(node.clone()))?;
                self.delete_entry(&parent, base_name(&node)).await?;
                Ok(CommandOutcome::Deleted(node))
            }
            Command::Move { node, destination } => {
                let snapshot = self.snapshot().ok_or(ContextError::NoDirectoryOpen)?;
                let entry = snapshot
                    .find(&node)
                    .ok_or_else(|| ContextError::UnknownNode(node.clone()))?;
                if entry.as_file().is_none() {
                    return Err(ContextError::NotAFile(node));
                }
                let source = snapshot
                    .parent_directory(&node)
                    .ok_or_else(|| ContextError::UnknownNode(node.clone()))?;
                let target = require_directory(Some(snapshot), &destination)?;
                let outcome = self.move_file(&source, &target, base_name(&node)).await?;
                Ok(CommandOutcome::Moved(outcome))
            }
        }
    }
}

fn require_directory(
    snapshot: Option<&TreeSnapshot>,
    id: &str,
) -> Result<Arc<dyn DirectoryHandle>, ContextError> {
    let snapshot = snapshot.ok_or(ContextError::NoDirectoryOpen)?;
    if let Some(dir) = snapshot.directory(id) {
        return Ok(dir);
    }
    if snapshot.contains(id) {
        Err(ContextError::NotADirectory(id.to_string()))
    } else {
        Err(ContextError::UnknownNode(id.to_string()))
    }
}
