//! Docker CLI invocation.

use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use crate::error::DockerError;
use crate::Result;

/// Result of a docker CLI invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Arguments passed after the binary.
    pub args: Vec<String>,

    /// Exit code (0 = success, -1 = killed by signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Whether the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, or the exit code if stderr is empty.
    pub fn failure_reason(&self) -> String {
        self.stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| format!("exit code {}", self.exit_code))
    }

    /// Whether stderr says the daemon could not be reached.
    pub fn daemon_unreachable(&self) -> bool {
        let stderr = self.stderr.to_ascii_lowercase();
        stderr.contains("cannot connect to the docker daemon")
            || stderr.contains("is the docker daemon running")
            || stderr.contains("error during connect")
    }

    /// Turn a failed invocation into an error.
    pub fn into_error(self) -> DockerError {
        if self.daemon_unreachable() {
            return DockerError::DaemonUnreachable(self.failure_reason());
        }
        DockerError::CommandFailed {
            command: self.args.first().cloned().unwrap_or_default(),
            exit_code: self.exit_code,
            reason: self.failure_reason(),
        }
    }
}

/// Thin async wrapper around the docker binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run the binary with `args`, capturing its output.
    ///
    /// A non-zero exit is not an error here; see [`DockerCli::run_checked`].
    /// No timeout is applied: the call waits for docker to finish.
    pub async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let start = Instant::now();
        debug!(binary = %self.binary, args = ?args, "Running docker command");

        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DockerError::DockerNotFound,
                _ => DockerError::Io(e),
            })?;

        let output = child.wait_with_output().await?;
        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(exit_code, duration_ms, "Docker command finished");

        Ok(CommandOutput {
            args: args.to_vec(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }

    /// Run and fail unless the command exits with code 0.
    pub async fn run_checked(&self, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(output.into_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            args: vec!["build".to_string()],
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            duration_ms: 5,
        }
    }

    #[test]
    fn test_failure_reason_uses_last_stderr_line() {
        let out = output(1, "step 1/3\nERROR: failed to solve: file not found\n\n");
        assert_eq!(out.failure_reason(), "ERROR: failed to solve: file not found");
    }

    #[test]
    fn test_failure_reason_falls_back_to_exit_code() {
        assert_eq!(output(125, "").failure_reason(), "exit code 125");
    }

    #[test]
    fn test_daemon_unreachable_detected() {
        let out = output(
            1,
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?",
        );
        assert!(out.daemon_unreachable());
        assert!(matches!(out.into_error(), DockerError::DaemonUnreachable(_)));
    }

    #[test]
    fn test_other_failures_are_command_failures() {
        match output(1, "denied: requested access").into_error() {
            DockerError::CommandFailed {
                command, exit_code, ..
            } => {
                assert_eq!(command, "build");
                assert_eq!(exit_code, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let cli = DockerCli::new("echo");
        let out = cli.run(&["hello".to_string()]).await.expect("echo runs");
        assert!(out.success());
        assert!(out.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_run_checked_rejects_non_zero_exit() {
        let cli = DockerCli::new("false");
        let err = cli.run_checked(&[]).await.unwrap_err();
        assert!(matches!(err, DockerError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let cli = DockerCli::new("/nonexistent/bin/docker");
        let err = cli.run(&["version".to_string()]).await.unwrap_err();
        assert!(matches!(err, DockerError::DockerNotFound));
    }
}
