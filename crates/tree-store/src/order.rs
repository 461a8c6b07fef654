//! Order records: the per-directory list of children in display order.
//!
//! An [`OrderRecord`] is plain data. Everything here is pure; reading and
//! writing the sidecar lives in [`crate::codec`], and aligning a record with
//! the filesystem lives in [`crate::reconcile`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether an entry is a markdown file or a subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    /// Filesystem base name (with `.md` for files)
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Milliseconds since epoch. Only used as a default order.
    #[serde(default)]
    pub created: i64,
}

impl OrderEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, created: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            created,
        }
    }

    pub fn file(name: impl Into<String>, created: i64) -> Self {
        Self::new(name, EntryKind::File, created)
    }

    pub fn folder(name: impl Into<String>, created: i64) -> Self {
        Self::new(name, EntryKind::Folder, created)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Ordered children of one directory, as persisted in its sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(default)]
    pub items: Vec<OrderEntry>,
}

impl OrderRecord {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_items(items: Vec<OrderEntry>) -> Self {
        let mut record = Self { items };
        record.dedup();
        record
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&OrderEntry> {
        self.items.iter().find(|e| e.name == name)
    }

    /// Names in display order.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|e| e.name.clone()).collect()
    }

    /// Drop later entries whose name was already seen. First occurrence wins.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.items.retain(|e| seen.insert(e.name.clone()));
    }

    /// Remove the entry named `name`, if any.
    pub fn remove(&mut self, name: &str) -> Option<OrderEntry> {
        self.position(name).map(|idx| self.items.remove(idx))
    }

    /// Put `entry` at the front, replacing any stale entry with the same name.
    pub fn prepend(&mut self, entry: OrderEntry) {
        self.remove(&entry.name);
        self.items.insert(0, entry);
    }

    /// Rename an entry in place, keeping its position.
    ///
    /// Returns false if no entry is named `old`. An existing entry already
    /// named `new` is dropped so names stay unique.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(idx) = self.position(old) else {
            return false;
        };
        if old == new {
            return true;
        }
        self.items[idx].name = new.to_string();
        if let Some(dup) = self
            .items
            .iter()
            .enumerate()
            .find(|(i, e)| *i != idx && e.name == new)
            .map(|(i, _)| i)
        {
            self.items.remove(dup);
        }
        true
    }

    /// Reorder all entries to follow `order`.
    ///
    /// Entries named in `order` come first, in that order. Entries not named
    /// keep their original relative order after them. Names in `order` that
    /// aren't in the record are ignored, as are repeats.
    pub fn reorder_items<S: AsRef<str>>(&mut self, order: &[S]) {
        self.items = arrange(std::mem::take(&mut self.items), order);
    }

    /// Legacy file-only reorder.
    ///
    /// Folder entries keep their relative order and move ahead of all files.
    /// Files then follow `order`, with unnamed files appended in original
    /// order.
    pub fn reorder_files<S: AsRef<str>>(&mut self, order: &[S]) {
        let (folders, files): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|e| e.is_folder());
        let mut items = folders;
        items.extend(arrange(files, order));
        self.items = items;
    }
}

/// Place `entries` named in `order` first, then the rest in original order.
fn arrange<S: AsRef<str>>(entries: Vec<OrderEntry>, order: &[S]) -> Vec<OrderEntry> {
    let mut remaining: Vec<Option<OrderEntry>> = entries.into_iter().map(Some).collect();
    let mut arranged = Vec::with_capacity(remaining.len());

    for name in order {
        let name = name.as_ref();
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| matches!(slot, Some(e) if e.name == name))
        {
            arranged.extend(slot.take());
        }
    }
    arranged.extend(remaining.into_iter().flatten());
    arranged
}
