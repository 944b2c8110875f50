// tests/end_to_end_dev_graph.rs
//
// Drives the orchestrator through the styles/scripts/serve graph with fake
// actions, covering phase transitions and the reload decision.

mod common;
use crate::common::builders::{TaskBuilder, new_log, recording_action, registry_of};
use crate::common::{init_tracing, with_timeout};

use std::collections::BTreeSet;

use stagehand::errors::StagehandError;
use stagehand::orchestrator::{Orchestrator, RunPhase};
use stagehand::registry::TaskRegistry;
use stagehand::reload::{ChangeCategory, ReloadNotifier};
use stagehand::runner::TaskRunner;

fn dev_registry(styles_fail: bool) -> (TaskRegistry, crate::common::builders::InvocationLog) {
    let log = new_log();
    let registry = registry_of(vec![
        TaskBuilder::new("styles")
            .category(ChangeCategory::Styles)
            .action(recording_action(log.clone(), styles_fail, None))
            .build(),
        TaskBuilder::new("scripts")
            .category(ChangeCategory::Scripts)
            .action(recording_action(log.clone(), false, None))
            .build(),
        TaskBuilder::new("serve")
            .needs("styles")
            .needs("scripts")
            .action(recording_action(log.clone(), false, None))
            .build(),
    ]);
    (registry, log)
}

fn orchestrator_for(registry: TaskRegistry) -> Orchestrator {
    Orchestrator::new(registry, TaskRunner::new(None), ReloadNotifier::new(8), "serve")
}

#[tokio::test]
async fn successful_dev_build_reaches_done() {
    with_timeout(async {
        init_tracing();

        let (registry, log) = dev_registry(false);
        let mut orchestrator = orchestrator_for(registry);
        assert_eq!(orchestrator.phase(), RunPhase::Idle);

        let report = orchestrator
            .run_once(&["serve".to_string()])
            .await
            .expect("dev build should succeed");

        assert_eq!(orchestrator.phase(), RunPhase::Done);
        assert!(report.succeeded());
        assert_eq!(
            report.categories_rebuilt(),
            BTreeSet::from([ChangeCategory::Styles, ChangeCategory::Scripts])
        );
        assert_eq!(log.lock().unwrap().len(), 3);
    })
    .await
}

#[tokio::test]
async fn styles_failure_fails_run_and_skips_serve() {
    with_timeout(async {
        init_tracing();

        let (registry, log) = dev_registry(true);
        let mut orchestrator = orchestrator_for(registry);

        let err = orchestrator
            .run_once(&["serve".to_string()])
            .await
            .unwrap_err();

        assert_eq!(orchestrator.phase(), RunPhase::Failed);
        match err {
            StagehandError::BuildFailed(failure) => {
                assert_eq!(failure.failed.len(), 1);
                assert_eq!(failure.failed[0].name, "styles");
                assert_eq!(failure.skipped, vec!["serve".to_string()]);
            }
            other => panic!("expected BuildFailed, got {other:?}"),
        }

        // scripts still ran to completion; serve never started.
        let invoked = log.lock().unwrap().clone();
        assert!(invoked.contains(&"scripts".to_string()));
        assert!(!invoked.contains(&"serve".to_string()));
    })
    .await
}

#[tokio::test]
async fn unknown_target_fails_during_resolution() {
    with_timeout(async {
        init_tracing();

        let (registry, log) = dev_registry(false);
        let mut orchestrator = orchestrator_for(registry);

        let err = orchestrator
            .run_once(&["deploy".to_string()])
            .await
            .unwrap_err();

        assert_eq!(orchestrator.phase(), RunPhase::Failed);
        assert!(matches!(err, StagehandError::UnknownTask(name) if name == "deploy"));
        assert!(log.lock().unwrap().is_empty());
    })
    .await
}

#[tokio::test]
async fn reload_broadcasts_only_for_successful_runs() {
    with_timeout(async {
        init_tracing();

        // Successful run: subscribers get the rebuilt categories.
        let (registry, _log) = dev_registry(false);
        let mut orchestrator = orchestrator_for(registry);
        let mut reload_rx = orchestrator.notifier().subscribe();

        let report = orchestrator
            .run_once(&["styles".to_string(), "scripts".to_string()])
            .await
            .expect("build should succeed");

        let extra = BTreeSet::from([ChangeCategory::Images]);
        assert!(orchestrator.notifier().notify(&report, &extra));

        let signal = reload_rx.recv().await.expect("reload signal expected");
        assert_eq!(
            signal.categories,
            BTreeSet::from([
                ChangeCategory::Styles,
                ChangeCategory::Scripts,
                ChangeCategory::Images
            ])
        );

        // Failed run: the notifier refuses to broadcast.
        use stagehand::dag::resolve;
        let (registry, _log) = dev_registry(true);
        let plan = resolve(&registry, &["serve".to_string()]).expect("should resolve");
        let report = TaskRunner::new(None).execute(&registry, &plan, 1).await;
        assert!(!report.succeeded());

        let notifier = ReloadNotifier::new(8);
        let mut rx = notifier.subscribe();
        assert!(!notifier.notify(&report, &BTreeSet::new()));
        assert!(rx.try_recv().is_err());
    })
    .await
}
