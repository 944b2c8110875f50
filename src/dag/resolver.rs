// src/dag/resolver.rs

//! Plan resolution: from requested task names to a staged execution order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::errors::{Result, StagehandError};
use crate::registry::TaskRegistry;

/// A staged execution order.
///
/// Each stage is a set of tasks with no dependency relationship among them,
/// safe to run concurrently; every task's prerequisites appear in an earlier
/// stage. Within a stage, tasks are ordered by registration order so plans
/// are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub stages: Vec<Vec<String>>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// All task names in plan order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().flatten().map(|s| s.as_str())
    }

    /// Index of the stage containing `name`, if the plan includes it.
    pub fn stage_of(&self, name: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.iter().any(|t| t == name))
    }
}

/// Resolve the requested task names into an [`ExecutionPlan`].
///
/// The plan covers the induced subgraph reachable from `targets` through
/// prerequisite edges. Stages are extracted by repeatedly taking every task
/// whose remaining prerequisites are all satisfied (zero in-degree).
///
/// Errors:
/// - [`StagehandError::UnknownTask`] if a requested name or a declared
///   prerequisite is not registered.
/// - [`StagehandError::DependencyCycle`] if extraction stalls; the error
///   names the tasks participating in the cycle.
pub fn resolve(registry: &TaskRegistry, targets: &[String]) -> Result<ExecutionPlan> {
    let graph = TaskGraph::from_registry(registry);

    // Collect the closure of tasks reachable from the targets. Lookup
    // failures surface unknown targets and unknown prerequisites alike.
    let mut needed: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = targets.to_vec();

    while let Some(name) = stack.pop() {
        if seen.contains(&name) {
            continue;
        }
        registry.lookup(&name)?;
        seen.insert(name.clone());
        for dep in graph.needs_of(&name) {
            if !seen.contains(dep) {
                stack.push(dep.clone());
            }
        }
        needed.push(name);
    }

    // Registration order is the deterministic tie-break within stages.
    needed.sort_by_key(|n| registry.position(n).unwrap_or(usize::MAX));

    // In-degrees restricted to the closure (graph edges are already deduped).
    let mut in_deg: HashMap<String, usize> = HashMap::new();
    for name in &needed {
        in_deg.insert(name.clone(), graph.needs_of(name).len());
    }

    let mut stages: Vec<Vec<String>> = Vec::new();
    let mut emitted: HashSet<String> = HashSet::new();

    while emitted.len() < needed.len() {
        let stage: Vec<String> = needed
            .iter()
            .filter(|n| !emitted.contains(*n) && in_deg.get(*n).copied() == Some(0))
            .cloned()
            .collect();

        if stage.is_empty() {
            let remaining: Vec<String> = needed
                .iter()
                .filter(|n| !emitted.contains(*n))
                .cloned()
                .collect();
            return Err(StagehandError::DependencyCycle(cycle_members(
                remaining, &graph,
            )));
        }

        for name in &stage {
            emitted.insert(name.clone());
            for dependent in graph.dependents_of(name) {
                if let Some(d) = in_deg.get_mut(dependent) {
                    *d = d.saturating_sub(1);
                }
            }
        }

        stages.push(stage);
    }

    debug!(targets = ?targets, stages = stages.len(), "resolved execution plan");
    Ok(ExecutionPlan { stages })
}

/// Trim the unresolved residue down to the tasks actually participating in a
/// cycle: nodes that merely sit downstream of one (nothing remaining depends
/// on them) are pruned iteratively.
fn cycle_members(mut remaining: Vec<String>, graph: &TaskGraph) -> Vec<String> {
    loop {
        let remaining_set: HashSet<&str> = remaining.iter().map(String::as_str).collect();
        let keep: Vec<String> = remaining
            .iter()
            .filter(|n| {
                graph
                    .dependents_of(n)
                    .iter()
                    .any(|d| remaining_set.contains(d.as_str()))
            })
            .cloned()
            .collect();

        if keep.len() == remaining.len() || keep.is_empty() {
            // An empty keep-set means the residue is degenerate; name
            // everything rather than nothing.
            return if keep.is_empty() { remaining } else { keep };
        }
        remaining = keep;
    }
}
