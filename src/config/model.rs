// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::reload::ChangeCategory;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// debounce_ms = 200
/// serve_task = "serve"
///
/// [default]
/// watch = ["src/**/*"]
///
/// [task.styles]
/// cmd = "sass src/styles/main.scss temp/styles/main.css"
/// watch = ["src/styles/**/*.scss"]
/// category = "styles"
///
/// [task.serve]
/// cmd = "miniserve temp"
/// needs = ["styles"]
/// service = true
/// ready_pattern = "Serving"
///
/// [[watch]]
/// patterns = ["src/img/**/*"]
/// tasks = []
/// category = "images"
/// ```
///
/// All sections are optional and have reasonable defaults, except that at
/// least one task must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Defaults for `watch` / `exclude` / `use_hash` from `[default]`.
    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Standalone watch bindings from `[[watch]]`.
    ///
    /// A binding with an empty `tasks` list runs nothing and only produces a
    /// reload signal for its category (useful for assets served straight
    /// from the source tree, like images).
    #[serde(default)]
    pub watch: Vec<ExtraWatch>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Debounce window in milliseconds: change events arriving within this
    /// window of the first one are coalesced into a single rebuild.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Upper bound on concurrently running task actions. `0` means no cap
    /// beyond the width of the current stage.
    #[serde(default)]
    pub max_workers: usize,

    /// Name of the task whose graph `stagehand serve` builds and watches.
    #[serde(default = "default_serve_task")]
    pub serve_task: String,
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_serve_task() -> String {
    "serve".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_workers: 0,
            serve_task: default_serve_task(),
        }
    }
}

/// `[default]` section: shared watch behaviour for tasks that do not
/// override it.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Default `watch` patterns applied to tasks that do not set their own.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Default `exclude` patterns applied to tasks that do not set their own.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Default hash-gating behaviour; if `None`, the global default is `false`.
    #[serde(default)]
    pub use_hash: Option<bool>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute.
    pub cmd: String,

    /// Prerequisite task names: all of these must settle successfully before
    /// this task may start.
    #[serde(default)]
    pub needs: Vec<String>,

    /// Task-local watch patterns. If `None`, the task uses `default.watch`.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Task-local exclude patterns. If `None`, the task uses `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Which slice of the build output this task produces. Drives the reload
    /// decision in connected clients (style injection vs full reload).
    #[serde(default)]
    pub category: Option<ChangeCategory>,

    /// Per-task hash gating; if `None`, falls back to `default.use_hash`.
    #[serde(default)]
    pub use_hash: Option<bool>,

    /// Whether this command is a long-running service (e.g. a dev server).
    ///
    /// A service task settles as soon as it is considered *ready* (see
    /// `ready_pattern` / `ready_after`); the process keeps running in the
    /// background and is killed on shutdown.
    #[serde(default)]
    pub service: bool,

    /// Regex matched against the service's stdout; the first matching line
    /// marks the service ready.
    #[serde(default)]
    pub ready_pattern: Option<String>,

    /// Duration string (e.g. `"3s"`, `"500ms"`) after which the service is
    /// considered ready regardless of output.
    #[serde(default)]
    pub ready_after: Option<String>,
}

impl TaskConfig {
    /// Effective `use_hash` given the `[default]` fallback.
    pub fn effective_use_hash(&self, default_use_hash: bool) -> bool {
        self.use_hash.unwrap_or(default_use_hash)
    }
}

/// A standalone `[[watch]]` binding: patterns paired with the tasks to
/// re-run when a matching change occurs.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraWatch {
    pub patterns: Vec<String>,

    /// Tasks to re-run on a match. May be empty for reload-only bindings.
    #[serde(default)]
    pub tasks: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Reload category reported when this binding fires.
    #[serde(default)]
    pub category: Option<ChangeCategory>,

    #[serde(default)]
    pub use_hash: Option<bool>,
}
