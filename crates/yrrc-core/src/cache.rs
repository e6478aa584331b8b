//! Sample cache directory: a flat store keyed by file name.
//!
//! Only names matter. Any entry whose name equals a hash counts as cached,
//! whatever its size or contents.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Names of the entries currently in `dir`. Non-UTF-8 names are skipped.
pub fn cached_names(dir: &Path) -> io::Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(raw) => tracing::debug!("skipping non-UTF-8 cache entry {:?}", raw),
        }
    }
    Ok(names)
}

/// Requested hashes not yet in the cache, sorted so launch order is stable.
pub fn pending(requested: &HashSet<String>, cached: &HashSet<String>) -> Vec<String> {
    let mut out: Vec<String> = requested.difference(cached).cloned().collect();
    out.sort();
    out
}
