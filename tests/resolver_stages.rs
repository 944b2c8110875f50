// tests/resolver_stages.rs

mod common;
use crate::common::builders::{TaskBuilder, registry_of};
use crate::common::init_tracing;

use stagehand::dag::resolve;
use stagehand::errors::StagehandError;
use stagehand::registry::TaskRegistry;

fn diamond() -> TaskRegistry {
    registry_of(vec![
        TaskBuilder::new("a").build(),
        TaskBuilder::new("b").needs("a").build(),
        TaskBuilder::new("c").needs("a").build(),
        TaskBuilder::new("d").needs("b").needs("c").build(),
    ])
}

#[test]
fn diamond_resolves_into_three_stages() {
    init_tracing();

    let registry = diamond();
    let plan = resolve(&registry, &["d".to_string()]).expect("diamond should resolve");

    assert_eq!(
        plan.stages,
        vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
            vec!["d".to_string()],
        ]
    );
}

#[test]
fn every_task_lands_after_all_its_prerequisites() {
    init_tracing();

    let registry = diamond();
    let plan = resolve(&registry, &["d".to_string()]).expect("diamond should resolve");

    for name in ["b", "c"] {
        assert!(plan.stage_of(name) > plan.stage_of("a"));
    }
    assert!(plan.stage_of("d") > plan.stage_of("b"));
    assert!(plan.stage_of("d") > plan.stage_of("c"));
}

#[test]
fn stage_tie_break_follows_registration_order() {
    init_tracing();

    let registry = registry_of(vec![
        TaskBuilder::new("zeta").build(),
        TaskBuilder::new("alpha").build(),
        TaskBuilder::new("mid").build(),
    ]);

    // Request in a different order than registration; the stage must still
    // come out in registration order.
    let plan = resolve(
        &registry,
        &["alpha".to_string(), "mid".to_string(), "zeta".to_string()],
    )
    .expect("independent tasks should resolve");

    assert_eq!(
        plan.stages,
        vec![vec![
            "zeta".to_string(),
            "alpha".to_string(),
            "mid".to_string()
        ]]
    );
}

#[test]
fn multiple_targets_share_one_plan() {
    init_tracing();

    let registry = diamond();
    let plan =
        resolve(&registry, &["b".to_string(), "c".to_string()]).expect("should resolve");

    // `a` appears once even though both targets need it.
    assert_eq!(
        plan.stages,
        vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
        ]
    );
}

#[test]
fn dev_graph_resolves_prereqs_into_the_first_stage() {
    init_tracing();

    let registry = registry_of(vec![
        TaskBuilder::new("styles").build(),
        TaskBuilder::new("scripts").build(),
        TaskBuilder::new("serve").needs("styles").needs("scripts").build(),
    ]);

    let plan = resolve(&registry, &["serve".to_string()]).expect("should resolve");

    assert_eq!(
        plan.stages,
        vec![
            vec!["styles".to_string(), "scripts".to_string()],
            vec!["serve".to_string()],
        ]
    );
}

#[test]
fn unknown_target_is_rejected() {
    init_tracing();

    let registry = diamond();
    let err = resolve(&registry, &["nope".to_string()]).unwrap_err();

    assert!(matches!(err, StagehandError::UnknownTask(name) if name == "nope"));
}

#[test]
fn unknown_prerequisite_is_rejected() {
    init_tracing();

    let registry = registry_of(vec![TaskBuilder::new("b").needs("missing").build()]);
    let err = resolve(&registry, &["b".to_string()]).unwrap_err();

    assert!(matches!(err, StagehandError::UnknownTask(name) if name == "missing"));
}

#[test]
fn two_task_cycle_names_both_participants() {
    init_tracing();

    let registry = registry_of(vec![
        TaskBuilder::new("a").needs("b").build(),
        TaskBuilder::new("b").needs("a").build(),
    ]);
    let err = resolve(&registry, &["a".to_string()]).unwrap_err();

    match err {
        StagehandError::DependencyCycle(mut names) => {
            names.sort();
            assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}

#[test]
fn cycle_report_excludes_tasks_merely_downstream_of_it() {
    init_tracing();

    let registry = registry_of(vec![
        TaskBuilder::new("a").needs("b").build(),
        TaskBuilder::new("b").needs("a").build(),
        TaskBuilder::new("c").needs("a").build(),
    ]);
    let err = resolve(&registry, &["c".to_string()]).unwrap_err();

    match err {
        StagehandError::DependencyCycle(mut names) => {
            names.sort();
            assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    init_tracing();

    let registry = registry_of(vec![TaskBuilder::new("a").needs("a").build()]);
    let err = resolve(&registry, &["a".to_string()]).unwrap_err();

    assert!(matches!(err, StagehandError::DependencyCycle(names) if names == vec!["a"]));
}

#[test]
fn duplicate_registration_is_rejected() {
    init_tracing();

    let mut registry = TaskRegistry::new();
    registry
        .register(TaskBuilder::new("a").build())
        .expect("first registration should succeed");
    let err = registry.register(TaskBuilder::new("a").build()).unwrap_err();

    assert!(matches!(err, StagehandError::DuplicateTask(name) if name == "a"));
}
