// src/runner/context.rs

//! Execution context for task actions.

/// Context handed to every task action when it runs.
///
/// Carries the run identifier (shared by all tasks of one plan execution)
/// and the task's own name, mostly for log attribution.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: u64,
    pub task: String,
}

impl RunContext {
    pub fn new(run_id: u64, task: impl Into<String>) -> Self {
        Self {
            run_id,
            task: task.into(),
        }
    }

    /// A tracing span covering this task's execution.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("task", run_id = self.run_id, task = %self.task)
    }
}
