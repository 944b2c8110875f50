#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;

use stagehand::exec::{FnAction, TaskAction};
use stagehand::registry::{Task, TaskRegistry};
use stagehand::reload::ChangeCategory;
use stagehand::runner::RunContext;

/// Shared log of task invocations, in invocation order.
pub type InvocationLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> InvocationLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// An action that does nothing and succeeds.
pub fn ok_action() -> Arc<dyn TaskAction> {
    Arc::new(FnAction(|_ctx: RunContext| async { anyhow::Ok(()) }))
}

/// An action that records its invocation, optionally sleeps, then succeeds
/// or fails.
pub fn recording_action(
    log: InvocationLog,
    fail: bool,
    delay: Option<Duration>,
) -> Arc<dyn TaskAction> {
    Arc::new(FnAction(move |ctx: RunContext| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(ctx.task.clone());
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                Err(anyhow!("boom"))
            } else {
                Ok(())
            }
        }
    }))
}

/// Builder for registry tasks in tests.
pub struct TaskBuilder {
    name: String,
    needs: Vec<String>,
    action: Arc<dyn TaskAction>,
    category: Option<ChangeCategory>,
}

impl TaskBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            needs: Vec::new(),
            action: ok_action(),
            category: None,
        }
    }

    pub fn needs(mut self, dep: &str) -> Self {
        self.needs.push(dep.to_string());
        self
    }

    pub fn action(mut self, action: Arc<dyn TaskAction>) -> Self {
        self.action = action;
        self
    }

    pub fn category(mut self, category: ChangeCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn build(self) -> Task {
        let mut task = Task::new(self.name, self.needs, self.action);
        if let Some(category) = self.category {
            task = task.with_category(category);
        }
        task
    }
}

/// Register the given tasks in order, panicking on duplicates.
pub fn registry_of(tasks: Vec<Task>) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for task in tasks {
        registry.register(task).expect("duplicate task in test registry");
    }
    registry
}
