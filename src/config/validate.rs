// src/config/validate.rs

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{Result, StagehandError};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one task
/// - the debounce window is non-zero
/// - all `needs` entries refer to existing tasks and none is a self-reference
/// - `[[watch]]` bindings refer to existing tasks
/// - the task graph has no cycles
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_references(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(StagehandError::Config(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(StagehandError::Config(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_references(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.needs.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(StagehandError::UnknownTask(dep.clone()));
            }
            if dep == name {
                return Err(StagehandError::Config(format!(
                    "task '{name}' cannot depend on itself in `needs`"
                )));
            }
        }
    }

    for (i, binding) in cfg.watch.iter().enumerate() {
        if binding.patterns.is_empty() {
            return Err(StagehandError::Config(format!(
                "[[watch]] entry {i} has no patterns"
            )));
        }
        for task in binding.tasks.iter() {
            if !cfg.task.contains_key(task) {
                return Err(StagehandError::UnknownTask(task.clone()));
            }
        }
    }

    Ok(())
}

fn validate_dag(cfg: &ConfigFile) -> Result<()> {
    // Build a petgraph graph from the tasks and their prerequisites.
    //
    // Edge direction: prerequisite -> task. For:
    //   [task.B]
    //   needs = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.needs.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // Any strongly connected component with more than one node is a cycle;
    // report its members so the user sees every participant at once.
    for component in tarjan_scc(&graph) {
        if component.len() > 1 {
            let mut names: Vec<String> =
                component.iter().map(|n| n.to_string()).collect();
            names.sort();
            return Err(StagehandError::DependencyCycle(names));
        }
    }

    Ok(())
}
