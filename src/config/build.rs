// src/config/build.rs

//! Turn a validated config into a runnable task registry.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::config::model::ConfigFile;
use crate::errors::{Result, StagehandError};
use crate::exec::CommandAction;
use crate::exec::service::parse_duration;
use crate::registry::{Task, TaskRegistry};

/// Build the task registry from `[task.<name>]` sections.
///
/// Commands run with the project root (the config file's directory) as their
/// working directory. Tasks register in name order, which makes plans
/// deterministic for config-defined graphs.
pub fn build_registry(cfg: &ConfigFile, root: &Path) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    for (name, tc) in cfg.task.iter() {
        let mut action = CommandAction::new(tc.cmd.clone(), root);

        if tc.service {
            action = action.service();
        }
        if let Some(pattern) = &tc.ready_pattern {
            let re = Regex::new(pattern).map_err(|e| {
                StagehandError::Config(format!("task '{name}': invalid ready_pattern: {e}"))
            })?;
            action = action.ready_pattern(re);
        }
        if let Some(after) = &tc.ready_after {
            let duration = parse_duration(after).map_err(|e| {
                StagehandError::Config(format!("task '{name}': invalid ready_after: {e}"))
            })?;
            action = action.ready_after(duration);
        }

        let mut task = Task::new(name.clone(), tc.needs.clone(), Arc::new(action));
        if let Some(category) = tc.category {
            task = task.with_category(category);
        }

        registry.register(task)?;
    }

    Ok(registry)
}
