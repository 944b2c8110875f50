// src/watch/hash.rs

//! Content hashing so unchanged saves do not re-trigger gated bindings.
//!
//! A binding with `use_hash = true` only fires when the aggregated contents
//! of its matched files actually changed — an editor touching a file without
//! altering it, or a save that rewrites identical bytes, is ignored. State is
//! in-memory and process-lifetime; the first observation always triggers.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, warn};

use crate::watch::patterns::{WatchBinding, collect_matching_files};

/// Compute the blake3 hash of one file's contents.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {path:?}"))?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// In-memory cache of per-file hashes.
///
/// Only the files that actually changed in a window are re-read and
/// re-hashed; everything else is served from the cache.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the hash for a file, computing and caching it if necessary.
    pub fn get_or_compute(&mut self, path: &Path) -> Result<String> {
        if let Some(hash) = self.hashes.get(path) {
            return Ok(hash.clone());
        }
        debug!("cache miss: computing hash for {:?}", path);
        let hash = compute_file_hash(path)?;
        self.hashes.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// Drop the cached hash for a file (e.g. on change).
    pub fn invalidate(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!("invalidated cache for {:?}", path);
        }
    }
}

/// Decides whether a gated binding's watched content actually changed.
#[derive(Debug, Default)]
pub struct HashGate {
    cache: FileCache,
    /// Last observed aggregate hash per binding label.
    last: HashMap<String, String>,
}

impl HashGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the binding should fire.
    ///
    /// Ungated bindings always fire. For gated ones, the changed paths are
    /// invalidated, every matched file is (re)hashed, and the aggregate is
    /// compared against the last observation. Errors err on the side of
    /// firing — a missed hash must never swallow a rebuild.
    pub fn content_changed(
        &mut self,
        root: &Path,
        binding: &WatchBinding,
        changed_paths: &BTreeSet<PathBuf>,
    ) -> bool {
        if !binding.use_hash() {
            return true;
        }

        for path in changed_paths {
            self.cache.invalidate(path);
        }

        let files = match collect_matching_files(root, binding) {
            Ok(files) => files,
            Err(err) => {
                warn!(
                    binding = %binding.label(),
                    error = %err,
                    "failed to collect watched files; triggering anyway"
                );
                return true;
            }
        };

        let mut file_hashes = Vec::with_capacity(files.len());
        for path in &files {
            match self.cache.get_or_compute(path) {
                Ok(hash) => file_hashes.push(hash),
                Err(err) => {
                    warn!(
                        binding = %binding.label(),
                        file = ?path,
                        error = %err,
                        "failed to hash watched file; triggering anyway"
                    );
                    return true;
                }
            }
        }

        let aggregate = aggregate_hash(&mut file_hashes);
        match self.last.insert(binding.label().to_string(), aggregate.clone()) {
            Some(previous) if previous == aggregate => {
                debug!(
                    binding = %binding.label(),
                    "watched content unchanged; suppressing trigger"
                );
                false
            }
            _ => true,
        }
    }
}

/// Stable aggregate over a set of per-file hashes, independent of file
/// discovery order.
fn aggregate_hash(file_hashes: &mut [String]) -> String {
    file_hashes.sort();
    let mut hasher = Hasher::new();
    for hash in file_hashes.iter() {
        hasher.update(hash.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
