//! The ordered folder/note tree rooted at one base directory.
//!
//! Every operation re-reads from disk; [`TreeStore`] holds nothing but the
//! base path. Folder paths are `/`-separated and relative to the base, with
//! `""` meaning the base itself.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::codec::{self, SIDECAR_NAME};
use crate::error::{Result, StoreError};
use crate::names::note_file_name;
use crate::order::{EntryKind, OrderEntry, OrderRecord};
use crate::reconcile;
use crate::scan::now_millis;

/// What a create operation found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Nothing was created; the entry was still moved to the front.
    AlreadyExisted,
}

/// What a rename operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// Nothing to rename; order untouched.
    SourceMissing,
    /// Target name is taken; nothing renamed, order untouched.
    TargetExists,
}

/// Ordered tree of folders and markdown notes under a base directory.
#[derive(Debug, Clone)]
pub struct TreeStore {
    base: PathBuf,
}

impl TreeStore {
    /// Open the store at `base`, creating the directory if needed.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|e| StoreError::io(&base, e))?;
        debug!("Opened tree store at {}", base.display());
        Ok(Self { base })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Absolute path of a folder given as a `/`-separated relative path.
    pub fn folder_path(&self, folder: &str) -> Result<PathBuf> {
        let mut path = self.base.clone();
        for segment in segments(folder)? {
            path.push(segment);
        }
        Ok(path)
    }

    /// Absolute path of a note (`.md` appended if missing).
    pub fn note_path(&self, folder: &str, file: &str) -> Result<PathBuf> {
        let file = note_file_name(file);
        check_name(&file)?;
        Ok(self.folder_path(folder)?.join(file))
    }

    // ==================== Listing ====================

    /// Top-level folders in display order.
    pub fn list_folders(&self) -> Result<Vec<String>> {
        self.list_subfolders("")
    }

    /// Folders directly inside `folder`, in display order.
    pub fn list_subfolders(&self, folder: &str) -> Result<Vec<String>> {
        Ok(self
            .list_items(folder)?
            .into_iter()
            .filter(|e| e.is_folder())
            .map(|e| e.name)
            .collect())
    }

    /// Markdown file names directly inside `folder`, in display order.
    pub fn list_markdown_files(&self, folder: &str) -> Result<Vec<String>> {
        Ok(self
            .list_items(folder)?
            .into_iter()
            .filter(|e| e.is_file())
            .map(|e| e.name)
            .collect())
    }

    /// Folders and files of `folder`, interleaved in display order.
    ///
    /// A missing folder lists as empty.
    pub fn list_items(&self, folder: &str) -> Result<Vec<OrderEntry>> {
        reconcile::view(&self.folder_path(folder)?)
    }

    // ==================== Folders ====================

    /// Create a top-level folder and put it first.
    pub fn create_folder(&self, name: &str) -> Result<CreateOutcome> {
        self.create_subfolder("", name)
    }

    /// Create `name` inside `parent` and put it first in the parent's order.
    ///
    /// The new folder gets its own (empty) order file straight away.
    pub fn create_subfolder(&self, parent: &str, name: &str) -> Result<CreateOutcome> {
        check_name(name)?;
        let parent_dir = self.folder_path(parent)?;
        let target = parent_dir.join(name);

        let outcome = if target.is_dir() {
            CreateOutcome::AlreadyExisted
        } else {
            fs::create_dir_all(&target).map_err(|e| StoreError::io(&target, e))?;
            CreateOutcome::Created
        };

        self.put_first(&parent_dir, OrderEntry::folder(name, now_millis()))?;
        reconcile::ensure(&target)?;

        info!("Create folder {:?} in {:?}: {:?}", name, parent, outcome);
        Ok(outcome)
    }

    /// Delete a folder and everything under it.
    ///
    /// `path` may be nested (`"Work/Old"`). Returns whether anything was
    /// removed from disk.
    pub fn delete_folder(&self, path: &str) -> Result<bool> {
        let (parent_dir, name) = self.split_parent(path)?;
        let target = parent_dir.join(&name);

        let removed = if target.is_dir() {
            fs::remove_dir_all(&target).map_err(|e| StoreError::io(&target, e))?;
            true
        } else {
            false
        };

        self.forget(&parent_dir, &name, removed)?;
        info!("Delete folder {:?}: removed={}", path, removed);
        Ok(removed)
    }

    /// Rename a possibly nested folder, keeping its place in the parent's order.
    ///
    /// `new_name` is a single path segment; the folder stays in its parent.
    pub fn rename_folder(&self, path: &str, new_name: &str) -> Result<RenameOutcome> {
        check_name(new_name)?;
        let (parent_dir, old_name) = self.split_parent(path)?;

        let outcome = rename_in(&parent_dir, &old_name, new_name, EntryKind::Folder)?;
        info!("Rename folder {:?} -> {:?}: {:?}", path, new_name, outcome);
        Ok(outcome)
    }

    // ==================== Notes ====================

    /// Create an empty note in `folder` and put it first.
    ///
    /// `.md` is appended to `name` if missing. An existing note is left
    /// untouched on disk.
    pub fn create_file(&self, folder: &str, name: &str) -> Result<CreateOutcome> {
        let file_name = note_file_name(name);
        check_name(&file_name)?;
        let dir = self.folder_path(folder)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let path = dir.join(&file_name);
        let outcome = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => CreateOutcome::Created,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => CreateOutcome::AlreadyExisted,
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        self.put_first(&dir, OrderEntry::file(file_name.as_str(), now_millis()))?;
        info!("Create note {:?} in {:?}: {:?}", file_name, folder, outcome);
        Ok(outcome)
    }

    /// Delete a note. Returns whether a file was removed.
    pub fn delete_markdown_file(&self, folder: &str, name: &str) -> Result<bool> {
        let file_name = note_file_name(name);
        check_name(&file_name)?;
        let dir = self.folder_path(folder)?;
        let path = dir.join(&file_name);

        let removed = if path.is_file() {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            true
        } else {
            false
        };

        self.forget(&dir, &file_name, removed)?;
        info!("Delete note {:?} in {:?}: removed={}", file_name, folder, removed);
        Ok(removed)
    }

    /// Rename a note in place. `.md` is appended to either name if missing.
    pub fn rename_markdown_file(&self, folder: &str, old: &str, new: &str) -> Result<RenameOutcome> {
        let old = note_file_name(old);
        let new = note_file_name(new);
        check_name(&old)?;
        check_name(&new)?;
        let dir = self.folder_path(folder)?;

        let outcome = rename_in(&dir, &old, &new, EntryKind::File)?;
        info!("Rename note {:?} -> {:?} in {:?}: {:?}", old, new, folder, outcome);
        Ok(outcome)
    }

    /// Note content, or an empty string if the note doesn't exist.
    pub fn read_note(&self, folder: &str, file: &str) -> Result<String> {
        let path = self.note_path(folder, file)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Write note content, creating the folder if needed.
    ///
    /// A note that didn't exist yet is put first, as with [`create_file`];
    /// saving an existing note leaves the order alone.
    ///
    /// [`create_file`]: TreeStore::create_file
    pub fn save_note(&self, folder: &str, file: &str, content: &str) -> Result<()> {
        let path = self.note_path(folder, file)?;
        let dir = self.folder_path(folder)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let existed = path.is_file();
        codec::atomic_write(&path, content.as_bytes())?;

        if !existed {
            let file_name = note_file_name(file);
            self.put_first(&dir, OrderEntry::file(file_name, now_millis()))?;
        }
        debug!("Saved note {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    // ==================== Reordering ====================

    /// Legacy reorder: folders first in their current order, then files in
    /// `order`, then files `order` didn't mention.
    pub fn reorder_files<S: AsRef<str>>(&self, folder: &str, order: &[S]) -> Result<()> {
        self.reorder_with(folder, |record| record.reorder_files(order))
    }

    /// Reorder folders and files of `parent` freely. `""` is the base folder.
    ///
    /// Entries missing from `order` are kept after the named ones.
    pub fn reorder_items<S: AsRef<str>>(&self, parent: &str, order: &[S]) -> Result<()> {
        self.reorder_with(parent, |record| record.reorder_items(order))
    }

    fn reorder_with(&self, folder: &str, apply: impl FnOnce(&mut OrderRecord)) -> Result<()> {
        let dir = self.folder_path(folder)?;
        if !dir.is_dir() {
            return Ok(());
        }
        let mut record = reconcile::current(&dir)?;
        apply(&mut record);
        codec::save(&dir, &record)?;
        debug!("Reordered {:?}: {:?}", folder, record.names());
        Ok(())
    }

    // ==================== Defaults ====================

    /// Create `defaults` as top-level folders if there are no folders yet.
    ///
    /// The first default ends up first. Returns the folders created.
    pub fn init_defaults(&self, defaults: &[&str]) -> Result<Vec<String>> {
        if !self.list_folders()?.is_empty() {
            return Ok(Vec::new());
        }
        for name in defaults.iter().rev() {
            self.create_folder(name)?;
        }
        info!("Created default folders: {:?}", defaults);
        Ok(defaults.iter().map(|s| s.to_string()).collect())
    }

    // ==================== Helpers ====================

    /// Split a non-empty folder path into its parent directory and last segment.
    fn split_parent(&self, path: &str) -> Result<(PathBuf, String)> {
        let mut parts = segments(path)?;
        let Some(name) = parts.pop() else {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "refers to the base folder".into(),
            });
        };
        let mut parent = self.base.clone();
        for segment in parts {
            parent.push(segment);
        }
        Ok((parent, name.to_string()))
    }

    /// Prepend `entry` to the order of `dir` and persist.
    fn put_first(&self, dir: &Path, entry: OrderEntry) -> Result<()> {
        let mut record = reconcile::current(dir)?;
        record.prepend(entry);
        codec::save(dir, &record)
    }

    /// Drop `name` from the order of `dir`, persisting if anything changed.
    ///
    /// If nothing was removed but the name still exists on disk (as the
    /// other kind), its entry stays where it is.
    fn forget(&self, dir: &Path, name: &str, removed_from_disk: bool) -> Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        if !removed_from_disk && dir.join(name).exists() {
            debug!("Keeping {:?} in order of {}: still on disk", name, dir.display());
            return Ok(());
        }
        let mut record = reconcile::current(dir)?;
        if record.remove(name).is_some() || removed_from_disk {
            codec::save(dir, &record)?;
        }
        Ok(())
    }
}

/// Rename `dir/old` to `dir/new` and rename its entry in place.
fn rename_in(dir: &Path, old: &str, new: &str, kind: EntryKind) -> Result<RenameOutcome> {
    let old_path = dir.join(old);
    let new_path = dir.join(new);

    let is_kind = match kind {
        EntryKind::Folder => old_path.is_dir(),
        EntryKind::File => old_path.is_file(),
    };
    if !is_kind {
        return Ok(RenameOutcome::SourceMissing);
    }
    if old != new && new_path.exists() {
        return Ok(RenameOutcome::TargetExists);
    }

    // Read before touching the disk so the new name isn't mistaken for an
    // unknown entry and pushed to the front
    let mut record = reconcile::current(dir)?;

    fs::rename(&old_path, &new_path).map_err(|e| StoreError::io(&old_path, e))?;

    if !record.rename(old, new) {
        record.prepend(OrderEntry::new(new, kind, now_millis()));
    }
    codec::save(dir, &record)?;
    Ok(RenameOutcome::Renamed)
}

/// Split a folder path into validated segments. Empty segments are skipped.
fn segments(path: &str) -> Result<Vec<&str>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s == "." || s == ".." || s.contains('\\') {
                Err(StoreError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("segment '{}' is not allowed", s),
                })
            } else {
                Ok(s)
            }
        })
        .collect()
}

/// Reject names that would escape their directory or clobber the order file.
fn check_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name refers to a directory")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name == SIDECAR_NAME || name.starts_with(&format!("{}.", SIDECAR_NAME)) {
        Some("name is reserved for the order file")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidPath {
            path: name.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}
