//! Reading and writing the `.order.json` sidecar.
//!
//! A sidecar that can't be read or parsed counts as "no information": the
//! caller gets an empty record and the next mutation writes a fresh file.

use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::order::OrderRecord;

/// Reserved name of the per-directory order file.
pub const SIDECAR_NAME: &str = ".order.json";

/// Path of the sidecar inside `dir`.
pub fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join(SIDECAR_NAME)
}

/// Whether `dir` already has a sidecar.
pub fn exists(dir: &Path) -> bool {
    sidecar_path(dir).is_file()
}

/// Load the record for `dir`.
///
/// Missing, unreadable and malformed sidecars all yield an empty record.
pub fn load(dir: &Path) -> OrderRecord {
    let path = sidecar_path(dir);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return OrderRecord::new(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return OrderRecord::new();
        }
    };

    match serde_json::from_str::<OrderRecord>(&contents) {
        Ok(mut record) => {
            record.dedup();
            record
        }
        Err(e) => {
            warn!("Ignoring malformed order file {}: {}", path.display(), e);
            OrderRecord::new()
        }
    }
}

/// Overwrite the sidecar for `dir` with `record`.
pub fn save(dir: &Path, record: &OrderRecord) -> Result<()> {
    let contents = serde_json::to_string_pretty(record)?;
    let path = sidecar_path(dir);
    atomic_write(&path, contents.as_bytes())?;
    debug!("Saved {} entries to {}", record.len(), path.display());
    Ok(())
}

/// Write through a hidden temp file in the same directory, then rename.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hidden = if file_name.starts_with('.') {
        file_name
    } else {
        format!(".{}", file_name)
    };
    let temp_path = path.with_file_name(format!("{}.{}.tmp", hidden, random_hex()));

    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::io(path, e));
    }

    Ok(())
}

fn random_hex() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    hex::encode(bytes)
}
