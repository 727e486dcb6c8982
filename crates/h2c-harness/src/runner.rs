//! Foreground command execution with deadlines

use crate::sink::{CapturedOutput, OutputSink};
use crate::{HarnessError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Outcome of a command that exited successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    command: String,
    exit_code: i32,
    stdout: CapturedOutput,
    stderr: CapturedOutput,
}

impl CommandResult {
    /// Command line that produced this result
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit code of the process
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Stdout lines joined with `\n`
    pub fn stdout(&self) -> String {
        self.stdout.text()
    }

    /// Stderr lines joined with `\n`
    pub fn stderr(&self) -> String {
        self.stderr.text()
    }

    /// Stdout as captured lines
    pub fn stdout_lines(&self) -> &[String] {
        self.stdout.lines()
    }

    /// Stderr as captured lines
    pub fn stderr_lines(&self) -> &[String] {
        self.stderr.lines()
    }

    /// Fail unless stdout contains `expected`
    pub fn assert_stdout_contains(&self, expected: &str) -> Result<()> {
        if self.stdout.contains(expected) {
            return Ok(());
        }
        Err(self.assertion(format!("Expected stdout to contain {:?}", expected)))
    }

    /// Fail unless stdout is longer than `len` characters
    pub fn assert_stdout_longer_than(&self, len: usize) -> Result<()> {
        let actual = self.stdout().chars().count();
        if actual > len {
            return Ok(());
        }
        Err(self.assertion(format!(
            "Expected more than {} characters on stdout, got {}",
            len, actual
        )))
    }

    fn assertion(&self, expectation: String) -> HarnessError {
        HarnessError::Assertion {
            command: self.command.clone(),
            expectation,
            stdout: self.stdout(),
        }
    }
}

/// Child process with both output streams attached to sinks
pub(crate) struct RunningProcess {
    command: String,
    child: Child,
    stdout: OutputSink,
    stderr: OutputSink,
    pumps: Vec<JoinHandle<()>>,
}

impl RunningProcess {
    /// Spawn `program` and start pumping its output
    pub(crate) fn spawn(program: &Path, args: &[String], command: String) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                command: command.clone(),
                source,
            })?;

        debug!("Spawned {:?} for: {}", child.id(), command);

        let stdout = OutputSink::new();
        let stderr = OutputSink::new();
        let mut pumps = Vec::with_capacity(2);

        if let Some(pipe) = child.stdout.take() {
            pumps.push(stdout.spawn_pump(pipe));
        }
        if let Some(pipe) = child.stderr.take() {
            pumps.push(stderr.spawn_pump(pipe));
        }

        Ok(Self {
            command,
            child,
            stdout,
            stderr,
            pumps,
        })
    }

    pub(crate) fn command(&self) -> &str {
        &self.command
    }

    /// Wait until the process has exited and both pipes are drained.
    ///
    /// A timeout leaves the process running.
    pub(crate) async fn wait(&mut self, timeout: Duration) -> Result<i32> {
        let child = &mut self.child;
        let pumps = &mut self.pumps;

        let waited = tokio::time::timeout(timeout, async {
            let status = child.wait().await?;
            for pump in pumps.drain(..) {
                if let Err(e) = pump.await {
                    debug!("Output pump did not finish: {}", e);
                }
            }
            Ok::<_, io::Error>(status)
        })
        .await;

        match waited {
            Ok(Ok(status)) => Ok(status.code().unwrap_or(-1)),
            Ok(Err(e)) => Err(HarnessError::Io(e)),
            Err(_) => Err(HarnessError::Timeout {
                command: self.command.clone(),
                timeout,
            }),
        }
    }

    /// Exit code if the process has already terminated
    pub(crate) fn try_exit_code(&mut self) -> Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(|status| status.code().unwrap_or(-1)))
    }

    pub(crate) async fn stdout(&self) -> CapturedOutput {
        self.stdout.snapshot().await
    }

    pub(crate) async fn stderr(&self) -> CapturedOutput {
        self.stderr.snapshot().await
    }

    /// Stdout followed by stderr, for failure reports
    pub(crate) async fn combined_output(&self) -> String {
        let mut lines = self.stdout.lines().await;
        lines.extend(self.stderr.lines().await);
        lines.join("\n")
    }
}

/// Runs one external program per call, bounded by a timeout
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    /// Arguments placed before every command's own arguments
    base_args: Vec<String>,
}

impl CommandRunner {
    /// Create a runner for `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Prefix every invocation with `args`, e.g. `docker exec <container> h2c`
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    /// Program this runner executes
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Printable command line for `args`
    pub fn command_line(&self, args: &[String]) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.base_args.iter().chain(args) {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn full_args(&self, args: &[String]) -> Vec<String> {
        self.base_args.iter().chain(args).cloned().collect()
    }

    /// Run to completion and require exit code 0
    pub async fn run(&self, args: &[String], timeout: Duration) -> Result<CommandResult> {
        let command = self.command_line(args);
        info!("{}", command);

        let mut process = RunningProcess::spawn(&self.program, &self.full_args(args), command.clone())?;
        let exit_code = process.wait(timeout).await?;
        let stdout = process.stdout().await;
        let stderr = process.stderr().await;

        if exit_code != 0 {
            return Err(HarnessError::ProcessFailed {
                command,
                exit_code,
                stderr: stderr.text(),
            });
        }

        Ok(CommandResult {
            command,
            exit_code,
            stdout,
            stderr,
        })
    }

    /// Start without waiting
    pub(crate) fn spawn(&self, args: &[String]) -> Result<RunningProcess> {
        let command = self.command_line(args);
        info!("{} (background)", command);
        RunningProcess::spawn(&self.program, &self.full_args(args), command)
    }
}

#[cfg(test)]
mod tests;
