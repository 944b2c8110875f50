// src/errors.rs

//! Crate-wide error types.

use std::fmt;

use thiserror::Error;

/// A failed task and its cause, as carried by [`StagehandError::BuildFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    pub name: String,
    pub cause: String,
}

/// Aggregate summary of a failed build run: every task that failed, and every
/// task that was skipped because something upstream of it failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFailure {
    pub failed: Vec<FailedTask>,
    pub skipped: Vec<String>,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build failed: {} task(s) failed", self.failed.len())?;
        for task in &self.failed {
            write!(f, "; '{}': {}", task.name, task.cause)?;
        }
        if !self.skipped.is_empty() {
            write!(f, "; skipped: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum StagehandError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("dependency cycle between tasks: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("{0}")]
    BuildFailed(BuildFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StagehandError {
    /// Process exit code for this error.
    ///
    /// Configuration problems (bad task graph, bad config file) exit with 2;
    /// execution failures exit with 1, so scripts can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            StagehandError::Config(_)
            | StagehandError::DuplicateTask(_)
            | StagehandError::UnknownTask(_)
            | StagehandError::DependencyCycle(_)
            | StagehandError::Toml(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, StagehandError>;
