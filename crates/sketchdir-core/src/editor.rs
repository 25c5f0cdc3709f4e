//! Binds the selected file to the drawing engine.
//!
//! The engine receives the loaded [`DiagramDocument`] as its initial scene
//! and reports every change back through [`EditorBinder::on_change`], which
//! feeds the debounced [`SaveQueue`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use sketchdir_platform::handle::FileHandle;
use sketchdir_platform::ErrorKind;

use crate::config::AppConfig;
use crate::document::{DiagramDocument, DocumentDefaults};
use crate::save_queue::SaveQueue;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    /// Nothing selected
    Empty,
    Ready(DiagramDocument),
    /// The file could not be read; `reload` tries again
    Failed { message: String },
}

pub struct EditorBinder {
    delay: Duration,
    defaults: DocumentDefaults,
    queue: Option<SaveQueue>,
    state: EditorState,
}

impl EditorBinder {
    pub fn new(delay: Duration, defaults: DocumentDefaults) -> Self {
        Self {
            delay,
            defaults,
            queue: None,
            state: EditorState::Empty,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.save_debounce(), DocumentDefaults::from(config))
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Scene to hand to the engine, if one is loaded
    pub fn document(&self) -> Option<&DiagramDocument> {
        match &self.state {
            EditorState::Ready(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&Arc<dyn FileHandle>> {
        self.queue.as_ref().map(SaveQueue::file)
    }

    /// Switch to another file, or to nothing.
    ///
    /// A save still waiting for its quiet period is dropped. A save already
    /// writing is awaited, so the new load never overlaps it.
    pub async fn select(&mut self, file: Option<Arc<dyn FileHandle>>) -> &EditorState {
        if let (Some(current), Some(next)) = (self.file(), file.as_ref()) {
            if current.is_same_entry(next.as_ref()) {
                return &self.state;
            }
        }

        if let Some(mut queue) = self.queue.take() {
            queue.cancel().await;
            queue.settle().await;
        }
        self.state = EditorState::Empty;

        if let Some(file) = file {
            self.queue = Some(SaveQueue::new(file, self.delay));
            self.load().await;
        }
        &self.state
    }

    /// Read the selected file again, e.g. after a failed load
    pub async fn reload(&mut self) -> &EditorState {
        if let Some(queue) = self.queue.as_mut() {
            queue.cancel().await;
            queue.settle().await;
            self.load().await;
        }
        &self.state
    }

    async fn load(&mut self) {
        let Some(file) = self.file().cloned() else {
            return;
        };

        self.state = match file.read_text().await {
            Ok(text) => {
                debug!("loaded {} ({} bytes)", file.name(), text.len());
                EditorState::Ready(DiagramDocument::from_text(&text, &self.defaults))
            }
            Err(e) if e.kind() == ErrorKind::MalformedContent => {
                warn!("{} is not text, opening it as an empty diagram", file.name());
                EditorState::Ready(DiagramDocument::empty(&self.defaults))
            }
            Err(e) => {
                warn!("failed to load {}: {}", file.name(), e);
                EditorState::Failed {
                    message: format!("failed to load {}: {}", file.name(), e),
                }
            }
        };
    }

    /// Engine change callback. Only the latest scene inside a quiet period is written.
    pub async fn on_change(&mut self, scene: DiagramDocument) {
        if !matches!(self.state, EditorState::Ready(_)) {
            debug!("ignoring change with no document loaded");
            return;
        }
        let Some(queue) = self.queue.as_mut() else {
            return;
        };

        match scene.to_pretty_json() {
            Ok(payload) => queue.schedule(payload).await,
            Err(e) => warn!("could not serialize scene for {}: {}", queue.file().name(), e),
        }
        self.state = EditorState::Ready(scene);
    }

    /// Write any pending change right away, e.g. before shutting down
    pub async fn flush(&mut self) {
        if let Some(queue) = self.queue.as_mut() {
            queue.flush().await;
            info!("flushed pending changes to {}", queue.file().name());
        }
    }

    pub async fn has_pending_save(&self) -> bool {
        match &self.queue {
            Some(queue) => queue.has_pending().await,
            None => false,
        }
    }
}
