//! tree-store: an ordered folder/note tree over a plain directory.
//!
//! Each directory carries a `.order.json` sidecar listing its children in
//! user-controlled display order. This crate provides:
//! - Reading/writing the sidecar (`codec`)
//! - Lazily creating and reconciling sidecars with the filesystem (`reconcile`)
//! - Listing, create/delete/rename and reorder operations (`TreeStore`)
//! - Note content I/O, name validation, session state and autosave

pub mod app_state;
pub mod autosave;
pub mod codec;
pub mod error;
pub mod names;
pub mod order;
pub mod reconcile;
pub mod scan;
pub mod store;

pub use app_state::{AppState, AppStateStore, OpenTab};
pub use autosave::Autosaver;
pub use error::{Result, StoreError};
pub use names::{validate_name, NameError};
pub use order::{EntryKind, OrderEntry, OrderRecord};
pub use store::{CreateOutcome, RenameOutcome, TreeStore};

/// Folders created in an empty notebook.
pub const DEFAULT_FOLDERS: &[&str] = &["Notebooks", "Resources", "Archive"];
