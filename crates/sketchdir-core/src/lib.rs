//! Directory browsing and diagram persistence on top of the capability
//! traits in `sketchdir-platform`.

pub mod command;
pub mod config;
pub mod context;
pub mod document;
pub mod editor;
pub mod explorer;
pub mod handle_store;
pub mod save_queue;
pub mod scanner;
pub mod session;
pub mod tree;

pub use command::{Command, CommandOutcome};
pub use context::{ContextError, FileSystemContext, MoveOutcome};
pub use document::{DiagramDocument, DocumentDefaults};
pub use editor::{EditorBinder, EditorState};
pub use explorer::{Explorer, Intent, Row};
pub use session::Session;
pub use tree::{NodeId, TreeNode, TreeSnapshot};
