//! Recursive directory walk producing a sorted tree snapshot.
//!
//! Nothing is cached: every call re-reads the whole subtree, so the result
//! always reflects what is on disk at the time of the call.

use std::cmp::Ordering;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

use sketchdir_platform::handle::{DirectoryHandle, EntryHandle};
use sketchdir_platform::FsError;

use crate::tree::{join_id, TreeNode, TreeSnapshot};

/// Scan `root` and wrap the result in a snapshot
pub async fn scan(root: Arc<dyn DirectoryHandle>, suffix: &str) -> Result<TreeSnapshot, FsError> {
    let nodes = scan_directory(root.as_ref(), "", suffix).await?;
    debug!("scanned {}: {} top-level entries", root.name(), nodes.len());
    Ok(TreeSnapshot::new(root, nodes))
}

/// Build the sorted children of `dir`. Ids are prefixed with `prefix`.
///
/// Hidden entries (leading `.`) are dropped at every depth, files are kept
/// only when their name ends in `suffix`, directories are always kept. Any
/// enumeration error anywhere in the subtree fails the whole scan.
pub fn scan_directory<'a>(
    dir: &'a dyn DirectoryHandle,
    prefix: &'a str,
    suffix: &'a str,
) -> BoxFuture<'a, Result<Vec<TreeNode>, FsError>> {
    async move {
        let entries = dir.entries().await?;

        // one subtree at a time: each open enumeration holds a descriptor
        let mut nodes = Vec::new();
        for entry in entries.into_iter().filter(|entry| is_visible(entry, suffix)) {
            let id = join_id(prefix, entry.name());
            let children = match &entry {
                EntryHandle::Directory(sub) => Some(scan_directory(sub.as_ref(), &id, suffix).await?),
                EntryHandle::File(_) => None,
            };
            nodes.push(TreeNode {
                name: entry.name().to_string(),
                id,
                handle: entry,
                children,
            });
        }

        sort_nodes(&mut nodes);
        Ok(nodes)
    }
    .boxed()
}

fn is_visible(entry: &EntryHandle, suffix: &str) -> bool {
    let name = entry.name();
    if name.starts_with('.') {
        return false;
    }
    match entry {
        EntryHandle::Directory(_) => true,
        EntryHandle::File(_) => name.ends_with(suffix),
    }
}

/// Directories first, then files, each group by name
pub fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| compare_names(&a.name, &b.name))
    });
}

/// Case-aware name order: letters compare case-insensitively first, and only
/// names differing purely in case fall back to lowercase-before-uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
