// src/exec/command.rs

//! Shell-command task actions.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::exec::action::{BoxedActionFuture, TaskAction};
use crate::exec::service::{spawn_line_logger, spawn_ready_monitor};
use crate::runner::RunContext;

/// A task action that shells out to an external tool.
///
/// Two modes:
/// - default: run the command to completion; a nonzero exit is a failure.
/// - service: the command is long-running (a dev server). The action settles
///   once the service is *ready* and the process keeps running detached.
///   Readiness comes from a stdout pattern, a fixed delay, or immediately
///   after spawn when neither is configured.
pub struct CommandAction {
    cmd: String,
    cwd: PathBuf,
    service: bool,
    ready_pattern: Option<Regex>,
    ready_after: Option<Duration>,
}

impl CommandAction {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
            service: false,
            ready_pattern: None,
            ready_after: None,
        }
    }

    /// Mark this command as a long-running service.
    pub fn service(mut self) -> Self {
        self.service = true;
        self
    }

    /// First stdout line matching `pattern` marks the service ready.
    pub fn ready_pattern(mut self, pattern: Regex) -> Self {
        self.ready_pattern = Some(pattern);
        self
    }

    /// The service counts as ready after this much time, regardless of output.
    pub fn ready_after(mut self, after: Duration) -> Self {
        self.ready_after = Some(after);
        self
    }

    /// Build a platform-appropriate shell invocation of `self.cmd`.
    fn shell_command(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.current_dir(&self.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_to_completion(&self, ctx: &RunContext) -> Result<()> {
        info!(
            task = %ctx.task,
            run_id = ctx.run_id,
            cmd = %self.cmd,
            "starting task process"
        );

        let mut child = self
            .shell_command()
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", ctx.task))?;

        if let Some(stdout) = child.stdout.take() {
            spawn_line_logger(ctx.task.clone(), "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_logger(ctx.task.clone(), "stderr", stderr);
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", ctx.task))?;

        let code = status.code().unwrap_or(-1);
        debug!(
            task = %ctx.task,
            run_id = ctx.run_id,
            exit_code = code,
            "task process exited"
        );

        if status.success() {
            Ok(())
        } else {
            bail!("command exited with code {code}")
        }
    }

    async fn run_service(&self, ctx: &RunContext) -> Result<()> {
        info!(
            task = %ctx.task,
            run_id = ctx.run_id,
            cmd = %self.cmd,
            "starting service process"
        );

        let mut child = self
            .shell_command()
            .spawn()
            .with_context(|| format!("spawning service process for task '{}'", ctx.task))?;

        let stdout = child.stdout.take();
        if let Some(stderr) = child.stderr.take() {
            spawn_line_logger(ctx.task.clone(), "stderr", stderr);
        }

        // No readiness condition: the service counts as up once it has spawned.
        if self.ready_pattern.is_none() && self.ready_after.is_none() {
            if let Some(stdout) = stdout {
                spawn_line_logger(ctx.task.clone(), "stdout", stdout);
            }
            detach(ctx.task.clone(), child);
            return Ok(());
        }

        let (ready_tx, mut ready_rx) = oneshot::channel::<()>();
        let mut pattern_armed = false;
        match (stdout, &self.ready_pattern) {
            (Some(stdout), Some(pattern)) => {
                spawn_ready_monitor(ctx.task.clone(), stdout, pattern.clone(), ready_tx);
                pattern_armed = true;
            }
            (Some(stdout), None) => {
                spawn_line_logger(ctx.task.clone(), "stdout", stdout);
            }
            (None, Some(_)) => {
                warn!(
                    task = %ctx.task,
                    "ready_pattern configured but no stdout pipe available"
                );
            }
            (None, None) => {}
        }

        loop {
            tokio::select! {
                status_res = child.wait() => {
                    let status = status_res.with_context(|| {
                        format!("waiting for service process of task '{}'", ctx.task)
                    })?;
                    // A service that exits cleanly before signalling readiness
                    // is treated as a completed task; a nonzero exit is a
                    // failed start.
                    let code = status.code().unwrap_or(-1);
                    if status.success() {
                        debug!(task = %ctx.task, "service exited cleanly before readiness");
                        return Ok(());
                    }
                    bail!("service exited with code {code} before becoming ready");
                }
                _ = maybe_sleep(self.ready_after), if self.ready_after.is_some() => {
                    debug!(task = %ctx.task, "service ready after configured delay");
                    break;
                }
                res = &mut ready_rx, if pattern_armed => {
                    match res {
                        Ok(()) => {
                            debug!(task = %ctx.task, "service ready (output matched)");
                            break;
                        }
                        Err(_) => {
                            // Output ended without a match; keep waiting on
                            // the process or the timer.
                            pattern_armed = false;
                        }
                    }
                }
            }
        }

        detach(ctx.task.clone(), child);
        Ok(())
    }
}

impl TaskAction for CommandAction {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxedActionFuture<'a> {
        Box::pin(async move {
            if self.service {
                self.run_service(ctx).await
            } else {
                self.run_to_completion(ctx).await
            }
        })
    }
}

/// Hand a ready service process to a background task that reaps it.
///
/// The child has `kill_on_drop` set, so it dies with the runtime on shutdown.
fn detach(task: String, mut child: Child) {
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => info!(
                task = %task,
                exit_code = status.code().unwrap_or(-1),
                "service process exited"
            ),
            Err(err) => warn!(task = %task, error = %err, "failed waiting on service process"),
        }
    });
}

async fn maybe_sleep(after: Option<Duration>) {
    match after {
        Some(after) => tokio::time::sleep(after).await,
        None => std::future::pending().await,
    }
}
