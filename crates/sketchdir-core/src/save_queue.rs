//! Debounced persistence for one file.
//!
//! A single slot holds the newest serialized payload and the instant it
//! becomes due. Each new payload overwrites the slot and pushes the deadline
//! out; one background task sleeps until the slot is due and writes it.
//! Payloads superseded inside the quiet period are never written.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info};

use sketchdir_platform::handle::{replace_contents, FileHandle};

struct PendingWrite {
    payload: String,
    deadline: Instant,
}

#[derive(Default)]
struct Slot {
    pending: Option<PendingWrite>,
    /// Background task alive
    running: bool,
    /// Background task is inside a write and must not be aborted
    writing: bool,
}

pub struct SaveQueue {
    file: Arc<dyn FileHandle>,
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
    task: Option<JoinHandle<()>>,
}

impl SaveQueue {
    pub fn new(file: Arc<dyn FileHandle>, delay: Duration) -> Self {
        Self {
            file,
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
            task: None,
        }
    }

    pub fn file(&self) -> &Arc<dyn FileHandle> {
        &self.file
    }

    /// Replace the pending payload and restart the quiet period
    pub async fn schedule(&mut self, payload: String) {
        let mut slot = self.slot.lock().await;
        slot.pending = Some(PendingWrite {
            payload,
            deadline: Instant::now() + self.delay,
        });
        if !slot.running {
            slot.running = true;
            let slot_ref = self.slot.clone();
            let file = self.file.clone();
            self.task = Some(tokio::spawn(run(slot_ref, file)));
        }
    }

    pub async fn has_pending(&self) -> bool {
        self.slot.lock().await.pending.is_some()
    }

    /// Drop the pending payload. A write already under way is left to finish.
    pub async fn cancel(&mut self) {
        let mut slot = self.slot.lock().await;
        if slot.pending.take().is_some() {
            debug!("discarded pending save of {}", self.file.name());
        }
        if slot.running && !slot.writing {
            if let Some(task) = self.task.take() {
                task.abort();
            }
            slot.running = false;
        }
    }

    /// Wait until no write is in flight
    pub async fn settle(&mut self) {
        if let Some(task) = self.task.take() {
            // an aborted task resolves with a cancellation error, which is expected
            let _ = task.await;
        }
    }

    /// Write the pending payload now instead of waiting for the quiet period
    pub async fn flush(&mut self) {
        let payload = {
            let mut slot = self.slot.lock().await;
            let payload = slot.pending.take().map(|p| p.payload);
            if slot.running && !slot.writing {
                if let Some(task) = self.task.take() {
                    task.abort();
                }
                slot.running = false;
            }
            payload
        };
        self.settle().await;
        if let Some(payload) = payload {
            write(self.file.as_ref(), &payload).await;
        }
    }
}

async fn run(slot: Arc<Mutex<Slot>>, file: Arc<dyn FileHandle>) {
    loop {
        let deadline = {
            let mut s = slot.lock().await;
            match &s.pending {
                Some(p) => p.deadline,
                None => {
                    s.running = false;
                    return;
                }
            }
        };

        time::sleep_until(deadline).await;

        let payload = {
            let mut s = slot.lock().await;
            let due = s
                .pending
                .as_ref()
                .is_some_and(|p| p.deadline <= Instant::now());
            if due {
                s.writing = true;
                s.pending.take().map(|p| p.payload)
            } else {
                None
            }
        };

        if let Some(payload) = payload {
            write(file.as_ref(), &payload).await;
            slot.lock().await.writing = false;
        }
    }
}

/// Failures are logged and dropped; the in-memory document stays as it is
async fn write(file: &dyn FileHandle, payload: &str) {
    match replace_contents(file, payload.as_bytes()).await {
        Ok(()) => info!("saved {} ({} bytes)", file.name(), payload.len()),
        Err(e) => error!("failed to save {}: {}", file.name(), e),
    }
}
