//! Listing the real children of a directory.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::codec::SIDECAR_NAME;
use crate::error::{Result, StoreError};
use crate::order::{EntryKind, OrderEntry};

/// Extension that makes a file show up in the tree.
pub const MARKDOWN_EXT: &str = ".md";

/// Current time in milliseconds since epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn millis(time: std::io::Result<SystemTime>) -> Option<i64> {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
}

/// Classify a directory child, or `None` if it doesn't belong in the tree.
fn classify(name: &str, metadata: &fs::Metadata) -> Option<EntryKind> {
    if name.starts_with('.') || name == SIDECAR_NAME {
        return None;
    }
    if metadata.is_dir() {
        Some(EntryKind::Folder)
    } else if metadata.is_file() && name.ends_with(MARKDOWN_EXT) {
        Some(EntryKind::File)
    } else {
        None
    }
}

/// List folders and markdown files directly inside `dir`.
///
/// `created` comes from the birth time where the platform has one, else the
/// modification time. A missing directory lists as empty. Order is whatever
/// the filesystem returns.
pub fn scan(dir: &Path) -> Result<Vec<OrderEntry>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        // Follows symlinks; a dangling link is skipped rather than failing the listing
        let Ok(metadata) = fs::metadata(entry.path()) else {
            continue;
        };

        if let Some(kind) = classify(&name, &metadata) {
            let created = millis(metadata.created())
                .or_else(|| millis(metadata.modified()))
                .unwrap_or(0);
            entries.push(OrderEntry::new(name, kind, created));
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sorted_names(entries: &[OrderEntry]) -> Vec<String> {
        let mut names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_scan_classifies_entries() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::create_dir(dir.join("Work")).unwrap();
        fs::write(dir.join("note.md"), "").unwrap();
        fs::write(dir.join("image.png"), "").unwrap();
        fs::write(dir.join(".hidden.md"), "").unwrap();
        fs::create_dir(dir.join(".git")).unwrap();
        fs::write(dir.join(SIDECAR_NAME), "{}").unwrap();

        let entries = scan(dir).unwrap();

        assert_eq!(sorted_names(&entries), vec!["Work", "note.md"]);
        let work = entries.iter().find(|e| e.name == "Work").unwrap();
        assert_eq!(work.kind, EntryKind::Folder);
        let note = entries.iter().find(|e| e.name == "note.md").unwrap();
        assert_eq!(note.kind, EntryKind::File);
        assert!(note.created > 0);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(scan(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_directory_named_like_markdown_is_folder() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("odd.md")).unwrap();

        let entries = scan(temp.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Folder);
    }
}
