// src/registry.rs

//! Task registration and lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{Result, StagehandError};
use crate::exec::TaskAction;
use crate::reload::ChangeCategory;

/// A registered unit of build work.
///
/// `needs` lists the tasks that must settle successfully before this one may
/// start. The action is behind an `Arc` so watch-triggered re-runs share it.
#[derive(Clone)]
pub struct Task {
    pub name: String,
    pub needs: Vec<String>,
    pub action: Arc<dyn TaskAction>,
    /// Which slice of the build output this task produces, if any.
    pub category: Option<ChangeCategory>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        needs: Vec<String>,
        action: Arc<dyn TaskAction>,
    ) -> Self {
        Self {
            name: name.into(),
            needs,
            action,
            category: None,
        }
    }

    pub fn with_category(mut self, category: ChangeCategory) -> Self {
        self.category = Some(category);
        self
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("needs", &self.needs)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of tasks, keyed by name.
///
/// Registration order is preserved; it is the deterministic tie-break used
/// when independent tasks land in the same stage of an execution plan.
///
/// Prerequisites are *not* checked at registration time — tasks may be
/// registered in any order, and unknown names or cycles surface when an
/// execution plan is resolved.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Fails if a task with the same name already exists.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.index.contains_key(&task.name) {
            return Err(StagehandError::DuplicateTask(task.name.clone()));
        }
        self.index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Look a task up by name, failing if it is not registered.
    pub fn lookup(&self, name: &str) -> Result<&Task> {
        self.get(name)
            .ok_or_else(|| StagehandError::UnknownTask(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    /// Position of a task in registration order.
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks)
            .finish()
    }
}
