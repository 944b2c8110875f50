// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod reload;
pub mod runner;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, build_registry, load_and_validate};
use crate::errors::{Result, StagehandError};
use crate::orchestrator::Orchestrator;
use crate::reload::ReloadNotifier;
use crate::runner::TaskRunner;
use crate::watch::bindings_from_config;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - registry / runner / notifier / orchestrator
/// - (for `serve`) watch bindings and the debounce window
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.tasks {
        print_task_list(&cfg);
        return Ok(());
    }

    let Some(command) = args.command else {
        return Err(StagehandError::Config(
            "nothing to do: pass `run <task...>`, `serve`, or `--tasks`".to_string(),
        ));
    };

    let root = config_root_dir(&config_path);
    let registry = build_registry(&cfg, &root)?;

    let max_workers = match cfg.config.max_workers {
        0 => None,
        n => Some(n),
    };
    let runner = TaskRunner::new(max_workers);
    let notifier = ReloadNotifier::new(16);
    let mut orchestrator =
        Orchestrator::new(registry, runner, notifier, cfg.config.serve_task.clone());

    match command {
        Command::Run { tasks } => {
            let report = orchestrator.run_once(&tasks).await?;
            info!(
                run_id = report.run_id,
                tasks = report.results.len(),
                "build finished"
            );
            Ok(())
        }
        Command::Serve => {
            let bindings = bindings_from_config(&cfg)?;
            let debounce = Duration::from_millis(cfg.config.debounce_ms);
            orchestrator.serve(&root, bindings, debounce).await
        }
    }
}

/// Project root for task working directories and watch patterns.
///
/// - If the config path has a non-empty parent (e.g. `site/Stagehand.toml`),
///   that directory is the root.
/// - For a bare filename, fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// `--tasks`: print every registered task and its declared prerequisites.
fn print_task_list(cfg: &ConfigFile) {
    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.needs.is_empty() {
            println!("      needs: {:?}", task.needs);
        }
        if let Some(ref watch) = task.watch {
            if !watch.is_empty() {
                println!("      watch: {:?}", watch);
            }
        }
        if let Some(ref exclude) = task.exclude {
            if !exclude.is_empty() {
                println!("      exclude: {:?}", exclude);
            }
        }
        if let Some(category) = task.category {
            println!("      category: {category}");
        }
        if let Some(use_hash) = task.use_hash {
            println!("      use_hash: {use_hash}");
        }
        if task.service {
            println!("      service: true");
        }
        if let Some(ref pattern) = task.ready_pattern {
            println!("      ready_pattern: {pattern}");
        }
        if let Some(ref after) = task.ready_after {
            println!("      ready_after: {after}");
        }
    }

    if !cfg.watch.is_empty() {
        println!("standalone watch bindings ({}):", cfg.watch.len());
        for binding in cfg.watch.iter() {
            println!(
                "  - patterns: {:?} -> tasks: {:?}",
                binding.patterns, binding.tasks
            );
        }
    }
}
