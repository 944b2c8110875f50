// src/exec/service.rs

//! Readiness and output helpers for service commands.

use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tracing::debug;

/// Consume a child output stream, logging each line at debug level.
///
/// Always attach one of these to unused pipes so OS buffers never fill.
pub(crate) fn spawn_line_logger<R>(task: String, label: &'static str, stream: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, "{label}: {line}");
        }
    });
}

/// Watch a service's stdout for the readiness pattern.
///
/// Sends on `ready_tx` at the first matching line, then keeps consuming the
/// stream so the process never blocks on a full pipe.
pub(crate) fn spawn_ready_monitor(
    task: String,
    stdout: tokio::process::ChildStdout,
    pattern: Regex,
    ready_tx: oneshot::Sender<()>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        let mut ready_tx = Some(ready_tx);

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, "stdout: {line}");
            if pattern.is_match(&line) {
                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(());
                }
            }
        }

        debug!(task = %task, "stdout stream ended");
    });
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{unit}'; expected ms, s, m, or h"
        )),
    }
}
