//! Aligning order records with what's actually on disk.
//!
//! Reads never rewrite a user's order: entries that appeared behind the
//! store's back are shown at the front of the listing but only persisted on
//! the next explicit mutation of that directory.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::codec;
use crate::error::Result;
use crate::order::{EntryKind, OrderEntry, OrderRecord};
use crate::scan::scan;

/// Newest first, then by name so equal timestamps stay deterministic.
fn sort_newest_first(entries: &mut [OrderEntry]) {
    entries.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.name.cmp(&b.name)));
}

/// Build a record for `dir` from the filesystem alone and persist it.
///
/// Discards any previous order, so it's only meant for directories that
/// have no sidecar yet. A missing directory yields an empty record and
/// nothing is written.
pub fn sync(dir: &Path) -> Result<OrderRecord> {
    if !dir.is_dir() {
        return Ok(OrderRecord::new());
    }

    let mut entries = scan(dir)?;
    sort_newest_first(&mut entries);
    let record = OrderRecord::from_items(entries);

    codec::save(dir, &record)?;
    info!("Initialized order for {} ({} entries)", dir.display(), record.len());
    Ok(record)
}

/// Load the record for `dir`, initializing it from the filesystem the first
/// time the directory is seen.
pub fn ensure(dir: &Path) -> Result<OrderRecord> {
    if !dir.is_dir() {
        return Ok(OrderRecord::new());
    }
    if codec::exists(dir) {
        Ok(codec::load(dir))
    } else {
        sync(dir)
    }
}

/// Return `record` with every real entry it doesn't know about prepended.
///
/// Missing entries keep newest-first order among themselves. Not persisted.
pub fn with_missing(record: &OrderRecord, real: &[OrderEntry]) -> OrderRecord {
    let mut missing: Vec<OrderEntry> = real
        .iter()
        .filter(|e| !record.contains(&e.name))
        .cloned()
        .collect();
    if missing.is_empty() {
        return record.clone();
    }

    debug!("{} entries missing from order record", missing.len());
    sort_newest_first(&mut missing);
    missing.extend(record.items.iter().cloned());
    OrderRecord::from_items(missing)
}

/// Ensured record merged with the real entries of `dir`, plus the kind of
/// every name present on disk.
///
/// The disk decides the kind if a name was replaced by the other kind.
fn merge(dir: &Path) -> Result<(OrderRecord, HashMap<String, EntryKind>)> {
    let record = ensure(dir)?;
    let real = scan(dir)?;
    let mut merged = with_missing(&record, &real);
    let present: HashMap<String, EntryKind> =
        real.into_iter().map(|e| (e.name, e.kind)).collect();

    for entry in &mut merged.items {
        if let Some(kind) = present.get(&entry.name) {
            entry.kind = *kind;
        }
    }
    Ok((merged, present))
}

/// The record for `dir` as a mutation should start from: ensured, with
/// unknown real entries absorbed at the front and kinds as found on disk.
///
/// Stale entries (gone from disk) are kept so that a reappearing name gets
/// its old position back.
pub fn current(dir: &Path) -> Result<OrderRecord> {
    merge(dir).map(|(record, _)| record)
}

/// What a listing of `dir` should show, in order.
///
/// Like [`current`], but entries that no longer exist on disk are hidden.
/// Never writes anything except the first-time sidecar from [`ensure`].
pub fn view(dir: &Path) -> Result<Vec<OrderEntry>> {
    let (record, present) = merge(dir)?;
    Ok(record
        .items
        .into_iter()
        .filter(|e| present.contains_key(&e.name))
        .collect())
}
