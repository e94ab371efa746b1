//! Process management layer
//!
//! Handles the language server's process lifecycle and stderr draining,
//! separate from the protocol spoken over its stdio.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Error types for process management
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Process not started")]
    NotStarted,

    #[error("Stdin not available")]
    StdinNotAvailable,

    #[error("Stdout not available")]
    StdoutNotAvailable,
}

/// How to stop a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Wait up to the given duration for the process to exit, then kill it
    Graceful(Duration),
    /// Kill immediately
    Force,
}

/// Language server child process with piped stdio
pub struct ServerProcess {
    command: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr_task: Option<JoinHandle<()>>,
}

impl ServerProcess {
    /// Spawn `command` with `args` in `working_directory`.
    ///
    /// Stderr is always drained into the log so the server never blocks on a
    /// full pipe.
    pub fn spawn(
        command: &str,
        args: &[String],
        working_directory: Option<&PathBuf>,
    ) -> Result<Self, ProcessError> {
        info!("Starting process: {} {:?}", command, args);

        let mut command_builder = Command::new(command);
        command_builder
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(working_dir) = working_directory {
            command_builder.current_dir(working_dir);
        }

        let mut child = command_builder.spawn().map_err(|source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        })?;
        info!("Process started with PID: {:?}", child.id());

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr_task = child.stderr.take().map(|stderr| {
            let label = command.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if !line.is_empty() {
                                debug!(target: "server_stderr", server = %label, "{}", line);
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            error!("Failed to read from stderr: {}", e);
                            break;
                        }
                    }
                }
                trace!("stderr monitoring finished for {}", label);
            })
        });

        Ok(Self {
            command: command.to_string(),
            child: Some(child),
            stdin,
            stdout,
            stderr_task,
        })
    }

    /// Take ownership of the process stdio for the protocol layer
    pub fn take_stdio(&mut self) -> Result<(ChildStdout, ChildStdin), ProcessError> {
        let stdout = self.stdout.take().ok_or(ProcessError::StdoutNotAvailable)?;
        let stdin = self.stdin.take().ok_or(ProcessError::StdinNotAvailable)?;
        Ok((stdout, stdin))
    }

    #[cfg(test)]
    pub fn process_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// Stop the process and reap it
    pub async fn stop(&mut self, mode: StopMode) -> Result<(), ProcessError> {
        let mut child = self.child.take().ok_or(ProcessError::NotStarted)?;

        if let StopMode::Graceful(grace) = mode {
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => {
                    info!("Process {} exited with status: {}", self.command, status);
                    self.abort_stderr_task();
                    return Ok(());
                }
                Ok(Err(e)) => warn!("Error waiting for {}: {}", self.command, e),
                Err(_) => warn!(
                    "Process {} did not exit within {:?}, killing",
                    self.command, grace
                ),
            }
        }

        child.kill().await?;
        info!("Killed process {}", self.command);
        self.abort_stderr_task();
        Ok(())
    }

    fn abort_stderr_task(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}
