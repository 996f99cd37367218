use crate::extract::ListingEntry;
use std::fs;
use std::path::Path;

/// Writes discovered listing entries as a target list
///
/// The file uses the keys `load_targets` reads, so discovery output can be
/// fed straight back into a harvest. Listing extras (price, rating, review
/// count) are kept alongside and ignored by the loader.
pub fn write_target_list(path: &Path, entries: &[ListingEntry]) -> crate::Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json)?;
    tracing::info!("Wrote {} targets to {}", entries.len(), path.display());
    Ok(entries.len())
}
