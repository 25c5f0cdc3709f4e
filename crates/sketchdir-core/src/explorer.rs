//! View state for the directory tree: which folders are expanded, and how
//! user intents on rows become context commands.

use std::collections::HashSet;

use sketchdir_platform::HandleKind;

use crate::command::Command;
use crate::tree::{parent_id, NodeId, TreeSnapshot, ROOT_ID};

/// One visible line of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: NodeId,
    pub depth: u16,
    pub name: String,
    pub kind: HandleKind,
    pub is_expanded: bool,
    pub is_selected: bool,
}

/// Something the user did to the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Select(NodeId),
    Toggle(NodeId),
    /// `target` is the row the action was invoked on; files resolve to their folder
    CreateFile { target: Option<NodeId>, name: String },
    CreateFolder { target: Option<NodeId>, name: String },
    Delete(NodeId),
    /// `onto` is the row the file was dropped on
    DragMove { node: NodeId, onto: Option<NodeId> },
}

#[derive(Debug, Default)]
pub struct Explorer {
    expanded: HashSet<NodeId>,
}

impl Explorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn expand_all(&mut self, snapshot: &TreeSnapshot) {
        for node in snapshot.walk() {
            if node.is_dir() {
                self.expanded.insert(node.id.clone());
            }
        }
    }

    /// Forget folders that no longer exist after a rescan
    pub fn prune(&mut self, snapshot: &TreeSnapshot) {
        self.expanded.retain(|id| snapshot.find(id).is_some_and(|n| n.is_dir()));
    }

    /// Flatten the visible part of the tree in display order
    pub fn rows(&self, snapshot: &TreeSnapshot, selection: Option<&str>) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut stack: Vec<_> = snapshot.nodes().iter().rev().map(|n| (n, 0u16)).collect();

        while let Some((node, depth)) = stack.pop() {
            let is_expanded = node.is_dir() && self.expanded.contains(&node.id);
            rows.push(Row {
                id: node.id.clone(),
                depth,
                name: node.name.clone(),
                kind: node.kind(),
                is_expanded,
                is_selected: selection == Some(node.id.as_str()),
            });
            if is_expanded {
                stack.extend(node.children().iter().rev().map(|c| (c, depth + 1)));
            }
        }
        rows
    }

    /// Turn an intent into a command. Intents that only change view state
    /// are applied here and yield `None`.
    pub fn dispatch(&mut self, snapshot: &TreeSnapshot, intent: Intent) -> Option<Command> {
        match intent {
            Intent::Select(id) => {
                let node = snapshot.find(&id)?;
                if node.is_dir() {
                    self.toggle(&id);
                    None
                } else {
                    Some(Command::Select(Some(id)))
                }
            }
            Intent::Toggle(id) => {
                self.toggle(&id);
                None
            }
            Intent::CreateFile { target, name } => {
                let parent = folder_for(snapshot, target.as_deref());
                self.expand(&parent);
                Some(Command::CreateFile { parent, name })
            }
            Intent::CreateFolder { target, name } => {
                let parent = folder_for(snapshot, target.as_deref());
                self.expand(&parent);
                Some(Command::CreateFolder { parent, name })
            }
            Intent::Delete(id) => Some(Command::Delete { node: id }),
            Intent::DragMove { node, onto } => {
                let destination = folder_for(snapshot, onto.as_deref());
                Some(Command::Move { node, destination })
            }
        }
    }
}

/// Folder a row stands for: itself when it is a folder, else its parent
fn folder_for(snapshot: &TreeSnapshot, target: Option<&str>) -> NodeId {
    match target.and_then(|id| snapshot.find(id)) {
        Some(node) if node.is_dir() => node.id.clone(),
        Some(node) => parent_id(&node.id).to_string(),
        None => ROOT_ID.to_string(),
    }
}
