//! Thin wrappers around external tool invocation.
//!
//! Every non-trivial action slipway takes is delegated to a pre-existing
//! tool (`kind`, `kubectl`, `helm`, `docker`, `coder`). These helpers run
//! such tools asynchronously, capture or stream their output, and turn
//! non-zero exit codes into errors that carry the full command line and
//! stderr.

mod error;

use std::process::{Output, Stdio};

use snafu::ResultExt;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::Command,
};

pub use self::error::Error;

/// Checks whether a tool is reachable through `PATH`.
pub async fn lookup(tool: &str) -> bool {
    Command::new("which")
        .arg(tool)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|status| status.success())
}

/// Runs a command to completion and returns its stdout.
///
/// # Errors
///
/// Returns [`Error::CommandFailed`] carrying the command line and stderr if
/// the command exits with a non-zero status.
pub async fn run(cmd: &str, args: &[&str]) -> Result<String, Error> {
    let command = render_command(cmd, args);
    let output = Command::new(cmd)
        .args(args)
        .output()
        .await
        .with_context(|_| error::SpawnSnafu { command: command.clone() })?;

    into_stdout(command, &output)
}

/// Runs a command, piping `input` to its stdin, and returns its stdout.
///
/// This is the render-then-apply idiom: a document is rendered in memory and
/// handed to the tool on stdin (`kind create cluster --config -`,
/// `helm upgrade --install --values -`), overwriting whatever was there
/// before rather than failing on conflict.
pub async fn run_with_stdin(cmd: &str, args: &[&str], input: &str) -> Result<String, Error> {
    let command = render_command(cmd, args);
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|_| error::SpawnSnafu { command: command.clone() })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .await
            .with_context(|_| error::WriteStdinSnafu { command: command.clone() })?;
    }

    let output = child
        .wait_with_output()
        .await
        .with_context(|_| error::ReadOutputSnafu { command: command.clone() })?;

    into_stdout(command, &output)
}

/// Runs a command, streaming its stdout lines through `tracing` as they
/// arrive. Used for long-running tool invocations whose progress is worth
/// relaying (chart installs, template pushes).
pub async fn run_streamed(cmd: &str, args: &[&str]) -> Result<(), Error> {
    let command = render_command(cmd, args);
    let mut child = Command::new(cmd)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|_| error::SpawnSnafu { command: command.clone() })?;

    let stderr_handle = child.stderr.take();

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) =
            lines.next_line().await.with_context(|_| error::ReadOutputSnafu {
                command: command.clone(),
            })?
        {
            tracing::info!("  {line}");
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|_| error::ReadOutputSnafu { command: command.clone() })?;

    if status.success() {
        Ok(())
    } else {
        let stderr = match stderr_handle {
            Some(stderr) => {
                let mut lines = BufReader::new(stderr).lines();
                let mut collected = Vec::new();
                while let Some(line) = lines.next_line().await.ok().flatten() {
                    collected.push(line);
                }
                collected.join("\n")
            }
            None => "command failed".to_string(),
        };
        Err(Error::CommandFailed { command, stderr })
    }
}

/// Runs a command without turning a failure into an error.
///
/// Returns `None` only if the command could not be spawned at all. Used by
/// best-effort paths (cleanup, diagnostics probes) where a failing exit
/// status is information, not a fault.
pub async fn run_unchecked(cmd: &str, args: &[&str]) -> Option<Output> {
    Command::new(cmd).args(args).output().await.ok()
}

fn render_command(cmd: &str, args: &[&str]) -> String {
    if args.is_empty() { cmd.to_string() } else { format!("{cmd} {}", args.join(" ")) }
}

fn into_stdout(command: String, output: &Output) -> Result<String, Error> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(Error::CommandFailed {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command_joins_arguments() {
        assert_eq!(render_command("kind", &["delete", "cluster"]), "kind delete cluster");
        assert_eq!(render_command("docker", &[]), "docker");
    }

    #[test]
    fn test_command_failed_display_carries_stderr() {
        let err = Error::CommandFailed {
            command: "helm upgrade".to_string(),
            stderr: "release not found".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("helm upgrade"));
        assert!(rendered.contains("release not found"));
    }

    #[tokio::test]
    async fn test_run_unchecked_reports_missing_binary() {
        let output = run_unchecked("slipway-test-no-such-binary", &[]).await;
        assert!(output.is_none());
    }
}
