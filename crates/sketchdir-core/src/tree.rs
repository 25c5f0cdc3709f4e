//! Immutable snapshot of a scanned directory.
//!
//! A snapshot is produced by one scan and never edited afterwards; every
//! filesystem change is followed by a fresh scan that replaces it.

use std::sync::Arc;

use sketchdir_platform::handle::{DirectoryHandle, EntryHandle, FileHandle, HandleKind};

/// Path of a node relative to the open root, `/`-separated. The root itself is `""`.
pub type NodeId = String;

pub const ROOT_ID: &str = "";

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub handle: EntryHandle,
    /// Sorted children, present only for directories
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn kind(&self) -> HandleKind {
        self.handle.kind()
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == HandleKind::Directory
    }

    pub fn as_file(&self) -> Option<&Arc<dyn FileHandle>> {
        match &self.handle {
            EntryHandle::File(f) => Some(f),
            EntryHandle::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Arc<dyn DirectoryHandle>> {
        match &self.handle {
            EntryHandle::Directory(d) => Some(d),
            EntryHandle::File(_) => None,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    root: Arc<dyn DirectoryHandle>,
    nodes: Vec<TreeNode>,
}

impl TreeSnapshot {
    pub fn new(root: Arc<dyn DirectoryHandle>, nodes: Vec<TreeNode>) -> Self {
        Self { root, nodes }
    }

    pub fn root(&self) -> &Arc<dyn DirectoryHandle> {
        &self.root
    }

    /// Top-level nodes
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if id == ROOT_ID {
            return None;
        }
        let mut level = self.nodes.as_slice();
        let mut found = None;
        for segment in id.split('/') {
            let node = level.iter().find(|n| n.name == segment)?;
            level = node.children();
            found = Some(node);
        }
        found
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Directory capability for `id`, where `""` is the root
    pub fn directory(&self, id: &str) -> Option<Arc<dyn DirectoryHandle>> {
        if id == ROOT_ID {
            return Some(self.root.clone());
        }
        self.find(id)?.as_directory().cloned()
    }

    /// Capability of the directory that holds `id`
    pub fn parent_directory(&self, id: &str) -> Option<Arc<dyn DirectoryHandle>> {
        self.directory(parent_id(id))
    }

    /// Every node in display order (depth first, siblings in sorted order)
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = self.nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().iter().rev());
        }
        out
    }
}

pub fn join_id(prefix: &str, name: &str) -> NodeId {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

pub fn parent_id(id: &str) -> &str {
    id.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(ROOT_ID)
}

/// Last path segment of an id
pub fn base_name(id: &str) -> &str {
    id.rsplit_once('/').map(|(_, name)| name).unwrap_or(id)
}

/// True when `id` is `ancestor` or lies somewhere below it
pub fn is_within(id: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    id == ancestor
        || (id.len() > ancestor.len()
            && id.starts_with(ancestor)
            && id.as_bytes()[ancestor.len()] == b'/')
}
