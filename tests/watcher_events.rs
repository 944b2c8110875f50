// tests/watcher_events.rs
//
// End-to-end watcher coverage: real filesystem events through `notify`,
// debounced into batches.

mod common;
use crate::common::init_tracing;

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use stagehand::reload::ChangeCategory;
use stagehand::watch::{WatchBatch, WatchBinding, spawn_watcher};

#[tokio::test]
async fn changes_to_overlapping_bindings_coalesce_into_one_batch() {
    init_tracing();

    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().to_path_buf();

    let bindings = vec![
        WatchBinding::new(
            "styles",
            vec!["styles".to_string()],
            &["*.scss".to_string()],
            &[],
        )
        .expect("binding"),
        WatchBinding::new(
            "scripts",
            vec!["scripts".to_string()],
            &["*.js".to_string()],
            &[],
        )
        .expect("binding"),
        // Overlaps with the styles binding on the same paths.
        WatchBinding::new(
            "lint",
            vec!["lint".to_string()],
            &["*.scss".to_string(), "*.js".to_string()],
            &[],
        )
        .expect("binding"),
    ];

    let (batch_tx, mut batch_rx) = mpsc::channel::<WatchBatch>(8);
    let _watcher = spawn_watcher(&root, bindings, Duration::from_millis(150), batch_tx)
        .expect("watcher should start");

    // Give the watcher backend a moment to arm.
    tokio::time::sleep(Duration::from_millis(250)).await;

    std::fs::write(root.join("main.scss"), b"body {}").expect("write scss");
    std::fs::write(root.join("app.js"), b"void 0;").expect("write js");

    let batch = timeout(Duration::from_secs(3), batch_rx.recv())
        .await
        .expect("batch should arrive before timeout")
        .expect("watcher channel should stay open");

    assert_eq!(
        batch.tasks,
        BTreeSet::from([
            "styles".to_string(),
            "scripts".to_string(),
            "lint".to_string()
        ])
    );
}

#[tokio::test]
async fn reload_only_binding_yields_a_taskless_batch() {
    init_tracing();

    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().to_path_buf();
    std::fs::create_dir_all(root.join("img")).expect("mkdir");

    let bindings = vec![
        WatchBinding::new("watch[0]", Vec::new(), &["img/**".to_string()], &[])
            .expect("binding")
            .with_category(Some(ChangeCategory::Images)),
    ];

    let (batch_tx, mut batch_rx) = mpsc::channel::<WatchBatch>(8);
    let _watcher = spawn_watcher(&root, bindings, Duration::from_millis(150), batch_tx)
        .expect("watcher should start");

    tokio::time::sleep(Duration::from_millis(250)).await;

    std::fs::write(root.join("img/logo.png"), b"\x89PNG").expect("write png");

    let batch = timeout(Duration::from_secs(3), batch_rx.recv())
        .await
        .expect("batch should arrive before timeout")
        .expect("watcher channel should stay open");

    assert!(batch.tasks.is_empty());
    assert_eq!(batch.categories, BTreeSet::from([ChangeCategory::Images]));
}
