// src/runner/report.rs

//! Per-task outcomes and the aggregate run report.

use std::collections::BTreeSet;

use crate::errors::{BuildFailure, FailedTask, StagehandError};
use crate::reload::ChangeCategory;

/// Terminal status of one task within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failed {
        cause: String,
    },
    /// The task was never started because something upstream of it did not
    /// succeed. `blocked_on` names the direct prerequisite that blocked it.
    Skipped {
        blocked_on: String,
    },
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }
}

/// One task's entry in a [`RunReport`].
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub name: String,
    pub category: Option<ChangeCategory>,
    pub status: TaskStatus,
}

/// Outcome of executing one plan. Transient: produced per run, consumed for
/// reporting and the reload decision. Nothing is persisted across runs.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: u64,
    pub results: Vec<TaskResult>,
}

impl RunReport {
    /// True when every task in the run settled successfully.
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|r| r.status.is_success())
    }

    pub fn status_of(&self, name: &str) -> Option<&TaskStatus> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.status)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &TaskResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Skipped { .. }))
    }

    /// Output categories rebuilt by the successful tasks of this run.
    pub fn categories_rebuilt(&self) -> BTreeSet<ChangeCategory> {
        self.results
            .iter()
            .filter(|r| r.status.is_success())
            .filter_map(|r| r.category)
            .collect()
    }

    /// Convert a failed run into its aggregate error, enumerating every
    /// failed and skipped task. Returns `None` for a fully successful run.
    pub fn to_error(&self) -> Option<StagehandError> {
        let failed: Vec<FailedTask> = self
            .results
            .iter()
            .filter_map(|r| match &r.status {
                TaskStatus::Failed { cause } => Some(FailedTask {
                    name: r.name.clone(),
                    cause: cause.clone(),
                }),
                _ => None,
            })
            .collect();

        let skipped: Vec<String> = self
            .results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Skipped { .. }))
            .map(|r| r.name.clone())
            .collect();

        if failed.is_empty() && skipped.is_empty() {
            None
        } else {
            Some(StagehandError::BuildFailed(BuildFailure { failed, skipped }))
        }
    }
}
