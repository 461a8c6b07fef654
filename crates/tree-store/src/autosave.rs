//! Periodic background save of the note being edited.
//!
//! The editor stages content with [`Autosaver::update`] on every change; a
//! tokio task writes the latest staged content on each tick if it changed.
//! Ticks and explicit flushes take turns on one write lock, so a slower
//! write of older content can never land after a newer one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::Result;
use crate::store::TreeStore;

#[derive(Debug, Default)]
struct Staged {
    target: Option<(String, String)>,
    content: String,
    /// Bumped on every update
    generation: u64,
    /// Generation last written to disk
    saved: u64,
}

/// State shared between the handle and the background task.
#[derive(Debug)]
struct Shared {
    store: Arc<TreeStore>,
    staged: Mutex<Staged>,
    /// Held for a whole snapshot, write and mark-saved sequence
    writing: Mutex<()>,
}

/// Background autosave for one edited note at a time.
pub struct Autosaver {
    shared: Arc<Shared>,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Autosaver {
    /// Start the autosave task. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<TreeStore>, period: Duration) -> Self {
        let shared = Arc::new(Shared {
            store,
            staged: Mutex::new(Staged::default()),
            writing: Mutex::new(()),
        });
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // File I/O stays off the runtime workers
                        let shared = Arc::clone(&task_shared);
                        match tokio::task::spawn_blocking(move || shared.flush()).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => error!("Autosave failed: {}", e),
                            Err(e) => error!("Autosave write panicked: {}", e),
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
            debug!("Autosave task stopped");
        });

        Self {
            shared,
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    /// Stage the latest content of a note.
    ///
    /// Switching to another note drops whatever was staged for the previous
    /// one, so callers should [`flush`](Self::flush) before switching.
    pub fn update(&self, folder: &str, file: &str, content: &str) {
        let mut staged = lock(&self.shared.staged);
        let target = (folder.to_string(), file.to_string());
        if staged.target.as_ref() != Some(&target) {
            staged.target = Some(target);
            staged.saved = staged.generation;
        }
        staged.content = content.to_string();
        staged.generation += 1;
    }

    /// Whether there are staged changes not yet on disk.
    pub fn is_dirty(&self) -> bool {
        let staged = lock(&self.shared.staged);
        staged.target.is_some() && staged.generation != staged.saved
    }

    /// Write staged content now. Returns whether anything was written.
    ///
    /// Waits for an in-flight background write to finish first. Once this
    /// returns, everything staged before the call is on disk.
    pub fn flush(&self) -> Result<bool> {
        self.shared.flush()
    }

    /// Stop the task and write anything still staged.
    pub async fn shutdown(mut self) -> Result<bool> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            error!("Autosave task ended abnormally: {}", e);
        }
        self.flush()
    }
}

/// A panic mid-update leaves plain data behind; keep going with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn flush(&self) -> Result<bool> {
        let _writing = lock(&self.writing);

        let (folder, file, content, generation) = {
            let staged = lock(&self.staged);
            let Some((folder, file)) = staged.target.clone() else {
                return Ok(false);
            };
            if staged.generation == staged.saved {
                return Ok(false);
            }
            (folder, file, staged.content.clone(), staged.generation)
        };

        // The staging lock is released so the editor never waits on disk
        self.store.save_note(&folder, &file, &content)?;

        let mut staged = lock(&self.staged);
        if staged.target.as_ref() == Some(&(folder.clone(), file.clone())) {
            staged.saved = generation;
        }
        debug!("Autosaved {}/{}", folder, file);
        Ok(true)
    }
}
