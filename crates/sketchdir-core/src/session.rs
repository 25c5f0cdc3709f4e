use tracing::{debug, warn};

use crate::command::{Command, CommandOutcome};
use crate::context::{ContextError, FileSystemContext};
use crate::editor::{EditorBinder, EditorState};
use crate::explorer::{Explorer, Intent, Row};

/// Application state for one window: directory context, tree view state and
/// the editor bound to the selection. Passed around explicitly; there is no
/// global instance.
pub struct Session {
    context: FileSystemContext,
    explorer: Explorer,
    editor: EditorBinder,
}

impl Session {
    pub fn new(context: FileSystemContext, editor: EditorBinder) -> Self {
        Self {
            context,
            explorer: Explorer::new(),
            editor,
        }
    }

    pub fn context(&self) -> &FileSystemContext {
        &self.context
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn explorer_mut(&mut self) -> &mut Explorer {
        &mut self.explorer
    }

    pub fn editor(&self) -> &EditorBinder {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorBinder {
        &mut self.editor
    }

    /// Visible tree rows, empty when no directory is open
    pub fn rows(&self) -> Vec<Row> {
        match self.context.snapshot() {
            Some(snapshot) => self.explorer.rows(snapshot, self.context.selection()),
            None => Vec::new(),
        }
    }

    /// Run a user intent from the tree view
    pub async fn handle_intent(&mut self, intent: Intent) -> Result<Option<CommandOutcome>, ContextError> {
        let Some(snapshot) = self.context.snapshot() else {
            return Err(ContextError::NoDirectoryOpen);
        };
        match self.explorer.dispatch(snapshot, intent) {
            Some(command) => self.execute(command).await.map(Some),
            None => Ok(None),
        }
    }

    /// Run a command, then bring the tree view and editor in line with the result
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome, ContextError> {
        debug!("executing {:?}", command);
        if matches!(command, Command::Move { .. }) {
            // the copy must carry the latest edits
            self.editor.flush().await;
        }
        let outcome = self.context.execute(command).await;
        // a failed command may still have changed the selection or snapshot
        self.sync().await;
        outcome
    }

    async fn sync(&mut self) {
        if let Some(snapshot) = self.context.snapshot() {
            self.explorer.prune(snapshot);
        }

        let selected = self.context.selected_file();
        let unchanged = match (self.editor.file(), selected.as_ref()) {
            (Some(current), Some(next)) => current.is_same_entry(next.as_ref()),
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            if let EditorState::Failed { message } = self.editor.select(selected).await {
                warn!("{}", message);
            }
        }
    }

    /// Write pending editor changes before the session ends
    pub async fn shutdown(&mut self) {
        self.editor.flush().await;
    }
}
