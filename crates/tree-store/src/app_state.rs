//! Persistence for editor session state.
//!
//! Open tabs and the last-opened note are stored in their own JSON file,
//! separate from the per-directory order files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::codec::atomic_write;
use crate::error::{Result, StoreError};
use crate::store::TreeStore;

/// A note reference: folder path plus file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTab {
    pub folder: String,
    pub file: String,
}

impl OpenTab {
    pub fn new(folder: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            file: file.into(),
        }
    }
}

/// Session state restored on startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub open_tabs: Vec<OpenTab>,
    #[serde(default)]
    pub last_opened: Option<OpenTab>,
}

impl AppState {
    /// Open a tab (or focus the existing one) and mark it last opened.
    pub fn open_tab(&mut self, tab: OpenTab) {
        if !self.open_tabs.contains(&tab) {
            self.open_tabs.push(tab.clone());
        }
        self.last_opened = Some(tab);
    }

    /// Close a tab. If it was the last opened one, the previous tab takes over.
    pub fn close_tab(&mut self, tab: &OpenTab) {
        let Some(idx) = self.open_tabs.iter().position(|t| t == tab) else {
            return;
        };
        self.open_tabs.remove(idx);

        if self.last_opened.as_ref() == Some(tab) {
            self.last_opened = self
                .open_tabs
                .get(idx.saturating_sub(1))
                .or_else(|| self.open_tabs.first())
                .cloned();
        }
    }

    /// Drop tabs whose notes are gone from disk.
    pub fn retain_existing(&mut self, store: &TreeStore) {
        let exists = |tab: &OpenTab| {
            store
                .note_path(&tab.folder, &tab.file)
                .map(|p| p.is_file())
                .unwrap_or(false)
        };

        self.open_tabs.retain(|t| exists(t));
        if self.last_opened.as_ref().is_some_and(|t| !exists(t)) {
            self.last_opened = self.open_tabs.last().cloned();
        }
    }
}

/// Storage for [`AppState`] at a fixed path.
pub struct AppStateStore {
    path: PathBuf,
}

impl AppStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state. Missing or unreadable state starts fresh.
    pub fn load(&self) -> AppState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppState::default(),
            Err(e) => {
                warn!("Failed to read app state {}: {}", self.path.display(), e);
                return AppState::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring malformed app state {}: {}", self.path.display(), e);
            AppState::default()
        })
    }

    /// Save state, creating the parent directory if needed.
    pub fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(state)?;
        atomic_write(&self.path, contents.as_bytes())
    }
}
