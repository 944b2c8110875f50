// src/dag/graph.rs

use std::collections::HashMap;

use crate::registry::TaskRegistry;

/// Internal node structure: immediate prerequisites and dependents.
#[derive(Debug, Clone)]
struct GraphNode {
    /// Direct prerequisites: tasks that must settle before this one can run.
    needs: Vec<String>,
    /// Direct dependents: tasks that list this one in their `needs`.
    dependents: Vec<String>,
}

/// Lightweight adjacency view over a registry.
///
/// Acyclicity is *not* assumed here; the resolver enforces it when a plan is
/// computed. This type only keeps adjacency information for planning and
/// diagnostics.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<String, GraphNode>,
}

impl TaskGraph {
    /// Build the adjacency view from a registry.
    ///
    /// Duplicate prerequisite entries collapse to one edge. Prerequisites
    /// that are not registered simply have no node; the resolver reports
    /// them as unknown when a plan touches them.
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let mut nodes: HashMap<String, GraphNode> = HashMap::new();

        for task in registry.iter() {
            let mut needs: Vec<String> = Vec::with_capacity(task.needs.len());
            for dep in &task.needs {
                if !needs.contains(dep) {
                    needs.push(dep.clone());
                }
            }
            nodes.insert(
                task.name.clone(),
                GraphNode {
                    needs,
                    dependents: Vec::new(),
                },
            );
        }

        let names: Vec<String> = nodes.keys().cloned().collect();
        for name in names {
            let needs = nodes
                .get(&name)
                .map(|n| n.needs.clone())
                .unwrap_or_default();

            for dep in needs {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// All task names in the graph.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate prerequisites of a task.
    pub fn needs_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.needs.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
