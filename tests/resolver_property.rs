// tests/resolver_property.rs
//
// Property: for any acyclic graph, the resolver places every task in a later
// stage than all of its (transitive) prerequisites.

mod common;
use crate::common::builders::{TaskBuilder, registry_of};

use std::collections::HashSet;

use proptest::prelude::*;

use stagehand::dag::resolve;
use stagehand::registry::TaskRegistry;

/// Generate dependency lists for `n` tasks where task `i` may only depend on
/// tasks `0..i`, guaranteeing acyclicity by construction.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..n), n).prop_map(
            move |raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, potential)| {
                        let mut deps: HashSet<usize> = HashSet::new();
                        for dep in potential {
                            if i > 0 {
                                deps.insert(dep % i);
                            }
                        }
                        let mut deps: Vec<usize> = deps.into_iter().collect();
                        deps.sort_unstable();
                        deps
                    })
                    .collect()
            },
        )
    })
}

fn build_registry(deps: &[Vec<usize>]) -> TaskRegistry {
    let tasks = deps
        .iter()
        .enumerate()
        .map(|(i, task_deps)| {
            let mut builder = TaskBuilder::new(&format!("task_{i}"));
            for dep in task_deps {
                builder = builder.needs(&format!("task_{dep}"));
            }
            builder.build()
        })
        .collect();
    registry_of(tasks)
}

proptest! {
    #[test]
    fn stages_respect_all_prerequisites(deps in dag_strategy(12)) {
        let registry = build_registry(&deps);
        let targets: Vec<String> = (0..deps.len()).map(|i| format!("task_{i}")).collect();

        let plan = resolve(&registry, &targets).expect("acyclic graph must resolve");

        // Every task appears exactly once.
        let planned: Vec<&str> = plan.tasks().collect();
        prop_assert_eq!(planned.len(), deps.len());

        for (i, task_deps) in deps.iter().enumerate() {
            let name = format!("task_{i}");
            let stage = plan.stage_of(&name).expect("task must be planned");
            for dep in task_deps {
                let dep_name = format!("task_{dep}");
                let dep_stage = plan.stage_of(&dep_name).expect("dep must be planned");
                prop_assert!(
                    dep_stage < stage,
                    "task_{} (stage {}) must come after task_{} (stage {})",
                    i, stage, dep, dep_stage
                );
            }
        }
    }

    #[test]
    fn resolving_a_single_target_pulls_in_exactly_its_closure(deps in dag_strategy(10)) {
        let registry = build_registry(&deps);
        let last = format!("task_{}", deps.len() - 1);

        let plan = resolve(&registry, &[last.clone()]).expect("acyclic graph must resolve");

        // Compute the expected closure by walking the dependency lists.
        let mut expected: HashSet<usize> = HashSet::new();
        let mut stack = vec![deps.len() - 1];
        while let Some(i) = stack.pop() {
            if expected.insert(i) {
                stack.extend(deps[i].iter().copied());
            }
        }

        let planned: HashSet<String> = plan.tasks().map(|s| s.to_string()).collect();
        let expected: HashSet<String> = expected.into_iter().map(|i| format!("task_{i}")).collect();
        prop_assert_eq!(planned, expected);
    }
}
