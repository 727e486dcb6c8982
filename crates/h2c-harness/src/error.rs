//! Error types for the h2c harness

use thiserror::Error;
use std::io;
use std::time::Duration;

/// Main error type for harness operations
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The command did not finish within its deadline
    #[error("{command}: Timeout after {timeout:?}")]
    Timeout {
        /// Command line that was waited on
        command: String,
        /// Duration that was exceeded
        timeout: Duration,
    },

    /// The background process did not exit within its deadline after `h2c stop`
    #[error("{command}: Timeout after {timeout:?}. Output of the background process:\n{output}\n")]
    StopTimeout {
        /// Command line the background process was started with
        command: String,
        /// Duration that was exceeded
        timeout: Duration,
        /// Everything the process wrote so far
        output: String,
    },

    /// The command exited with a non-zero status
    #[error("{command}: Process failed with exit code {exit_code}. Dump of stderr:\n{stderr}\n")]
    ProcessFailed {
        /// Command line that failed
        command: String,
        /// Exit code, or -1 if the process was terminated by a signal
        exit_code: i32,
        /// Everything the process wrote to stderr
        stderr: String,
    },

    /// Captured output did not match what the test expected
    #[error("{command}: {expectation}. Unexpected output:\n{stdout}\n")]
    Assertion {
        /// Command line whose output was inspected
        command: String,
        /// What was expected
        expectation: String,
        /// Captured stdout
        stdout: String,
    },

    /// The process could not be spawned at all
    #[error("{command}: Failed to spawn process: {source}")]
    Spawn {
        /// Command line that could not be started
        command: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The background process never answered the readiness probe
    #[error("Background process not ready after {attempts} probe attempts: {last_error}")]
    NotReady {
        /// Number of probes issued
        attempts: u32,
        /// Failure reported by the last probe
        last_error: Box<HarnessError>,
    },

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A previous background process was never torn down
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HarnessError {
    /// Whether this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::StopTimeout { .. })
    }

    /// Exit code carried by a process failure, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
