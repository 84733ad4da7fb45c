//! External process execution.
//!
//! Transcoders invoke external tools through the `ProcessRunner` capability
//! instead of spawning directly, so tests can substitute a scripted runner
//! and the pipeline can enforce a uniform timeout policy.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use mediary_core::IngestError;

/// Process execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Executable not found: {0}")]
    NotFound(String),

    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("Failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ProcessError> for IngestError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound(program) => IngestError::dependency_missing(program),
            ProcessError::Timeout {
                program,
                timeout_secs,
            } => IngestError::TranscodeTimeout {
                tool: program,
                timeout_secs,
            },
            ProcessError::Io { program, source } => IngestError::TranscodeFailed {
                tool: program,
                detail: source.to_string(),
            },
        }
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Capability for running external tools.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a program to completion, capturing stdout and stderr.
    ///
    /// The process is killed if it does not finish within `timeout`.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// `ProcessRunner` backed by real child processes.
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    #[tracing::instrument(skip(self, args), fields(process.executable.name = %program))]
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let start = std::time::Instant::now();

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::NotFound(program.to_string())
                } else {
                    ProcessError::Io {
                        program: program.to_string(),
                        source: e,
                    }
                }
            })?;

        // Dropping the wait future on timeout drops the child handle, which
        // kills the process via kill_on_drop.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ProcessError::Io {
                program: program.to_string(),
                source: e,
            })?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "External process timed out and was killed"
                );
                return Err(ProcessError::Timeout {
                    program: program.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        tracing::debug!(
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "External process finished"
        );

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
