// src/watch/patterns.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::model::ConfigFile;
use crate::errors::{Result, StagehandError};
use crate::reload::ChangeCategory;

/// Default watch configuration from `[default]` in the config.
#[derive(Debug, Clone, Default)]
pub struct WatchDefaults {
    pub watch: Vec<String>,
    pub exclude: Vec<String>,
}

/// A compiled watch binding: filesystem patterns paired with the tasks to
/// re-run when a matching change occurs.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths (e.g. `"src/styles/main.scss"`) into [`WatchBinding::matches`].
///
/// `tasks` may be empty: such a binding triggers no build, only a reload
/// signal carrying `category` (assets served straight from the source tree).
pub struct WatchBinding {
    label: String,
    tasks: Vec<String>,
    category: Option<ChangeCategory>,
    use_hash: bool,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("label", &self.label)
            .field("tasks", &self.tasks)
            .field("category", &self.category)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(
        label: impl Into<String>,
        tasks: Vec<String>,
        watch: &[String],
        exclude: &[String],
    ) -> Result<Self> {
        let label = label.into();
        let watch_set = build_globset(watch)
            .map_err(|e| StagehandError::Config(format!("watch binding '{label}': {e}")))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).map_err(|e| {
                StagehandError::Config(format!("watch binding '{label}': {e}"))
            })?)
        };

        Ok(Self {
            label,
            tasks,
            category: None,
            use_hash: false,
            watch_set,
            exclude_set,
        })
    }

    pub fn with_category(mut self, category: Option<ChangeCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn with_use_hash(mut self, use_hash: bool) -> Self {
        self.use_hash = use_hash;
        self
    }

    /// Stable label for diagnostics and hash-gate bookkeeping.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn category(&self) -> Option<ChangeCategory> {
        self.category
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Whether this binding is interested in the given path (relative to the
    /// project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build one binding per watched task (task-local patterns, falling back to
/// `[default]`), plus one per standalone `[[watch]]` entry.
///
/// Tasks with no patterns anywhere are simply not watched.
pub fn bindings_from_config(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let defaults = WatchDefaults {
        watch: cfg.default.watch.clone(),
        exclude: cfg.default.exclude.clone(),
    };
    let default_use_hash = cfg.default.use_hash.unwrap_or(false);

    let mut bindings = Vec::new();

    for (name, task) in cfg.task.iter() {
        let watch = task.watch.as_ref().unwrap_or(&defaults.watch);
        if watch.is_empty() {
            continue;
        }
        let exclude = task.exclude.as_ref().unwrap_or(&defaults.exclude);

        let binding = WatchBinding::new(name.clone(), vec![name.clone()], watch, exclude)?
            .with_category(task.category)
            .with_use_hash(task.effective_use_hash(default_use_hash));
        bindings.push(binding);
    }

    for (i, extra) in cfg.watch.iter().enumerate() {
        let label = format!("watch[{i}]");
        let binding = WatchBinding::new(
            label,
            extra.tasks.clone(),
            &extra.patterns,
            &extra.exclude,
        )?
        .with_category(extra.category)
        .with_use_hash(extra.use_hash.unwrap_or(default_use_hash));
        bindings.push(binding);
    }

    Ok(bindings)
}

/// Collect all files under `root` that match this binding's patterns.
///
/// Used when computing aggregated content hashes for `use_hash` bindings.
pub fn collect_matching_files(root: &Path, binding: &WatchBinding) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if binding.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    Ok(files)
}

fn build_globset(patterns: &[String]) -> std::result::Result<GlobSet, String> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| format!("invalid glob pattern '{pat}': {e}"))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| e.to_string())
}
