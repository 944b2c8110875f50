// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - Compiling watch/exclude glob patterns into per-binding matchers
//!   (`patterns`).
//! - Wiring up a cross-platform filesystem watcher via `notify` (`watcher`).
//! - Coalescing bursts of change events into one batch per debounce window
//!   (`debounce`).
//! - Content hashing so unchanged saves do not re-trigger gated bindings
//!   (`hash`).
//!
//! It knows nothing about dependency resolution; it only turns filesystem
//! changes into batches of task names for the orchestrator.

pub mod debounce;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::{Coalescer, WatchBatch};
pub use hash::{FileCache, HashGate, compute_file_hash};
pub use patterns::{WatchBinding, WatchDefaults, bindings_from_config, collect_matching_files};
pub use watcher::{WatcherHandle, spawn_watcher};
