//! Bounded child-process execution
//!
//! Every external command (nsupdate, rndc) goes through [`run`]: spawn with
//! piped stdio, then feed stdin and wait under one timeout. The child is killed if the
//! timeout elapses. Nothing here returns an error; all failures become a
//! failed [`ExecOutcome`].

use std::process::Stdio;
use std::time::Duration;

use dnsync_core::traits::{ExecOutcome, FailureKind};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Run `program` with `args`, writing `input` to its stdin
///
/// Exit status zero is success. The timeout covers writing stdin as well
/// as waiting for the child. Spawn failures and timeouts are classified
/// as transient; a non-zero exit is classified from the child's output.
pub async fn run(program: &str, args: &[String], input: Option<&str>, timeout: Duration) -> ExecOutcome {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::error!("Failed to spawn {}: {}", program, e);
            return ExecOutcome::failed_with(
                FailureKind::Transient,
                format!("Failed to spawn {}: {}", program, e),
            );
        }
    };

    let stdin = child.stdin.take();
    let feed = async move {
        if let (Some(input), Some(mut stdin)) = (input, stdin) {
            // The child may exit before reading everything; its exit status tells the story
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                tracing::debug!("Writing stdin of {} failed: {}", program, e);
            }
        }
    };
    // One deadline covers feeding stdin and collecting output
    let exchange = async move {
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        output
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            if output.status.success() {
                ExecOutcome::succeeded(stdout, stderr)
            } else {
                tracing::debug!("{} exited with {}", program, output.status);
                let stderr = if stderr.trim().is_empty() {
                    format!("{} exited with {}", program, output.status)
                } else {
                    stderr
                };
                ExecOutcome::failed(stdout, stderr)
            }
        }
        Ok(Err(e)) => ExecOutcome::failed_with(
            FailureKind::Transient,
            format!("Failed to wait for {}: {}", program, e),
        ),
        // Dropping the exchange drops the child, which kills it
        Err(_) => ExecOutcome::failed_with(
            FailureKind::Transient,
            format!("{} timed out after {}s", program, timeout.as_secs()),
        ),
    }
}
