//! Persistent h2c process lifecycle

use crate::command::H2cCommand;
use crate::runner::RunningProcess;
use crate::{H2c, HarnessError, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The `h2c start` process that serves foreground commands.
///
/// `stop` consumes the handle, so a stopped process cannot be reused.
pub struct BackgroundProcess {
    process: RunningProcess,
}

impl BackgroundProcess {
    /// Launch `h2c start` and poll `h2c pid` until the process answers.
    ///
    /// Fails early if the process exits before it becomes ready.
    pub async fn start(h2c: &H2c) -> Result<Self> {
        let process = h2c.runner().spawn(&H2cCommand::Start.args())?;
        let mut background = Self { process };
        background.wait_until_ready(h2c).await?;
        info!("Background process ready: {}", background.process.command());
        Ok(background)
    }

    async fn wait_until_ready(&mut self, h2c: &H2c) -> Result<()> {
        let readiness = &h2c.config().readiness;
        let max_attempts = readiness.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if let Some(exit_code) = self.process.try_exit_code()? {
                return Err(self.exited_early(exit_code, readiness.probe_timeout).await);
            }

            match h2c.run_with_timeout(&H2cCommand::Pid, readiness.probe_timeout).await {
                Ok(_) => {
                    debug!("Readiness probe succeeded on attempt {}", attempt);
                    return Ok(());
                }
                Err(e) if attempt >= max_attempts => {
                    warn!("Readiness probe gave up after {} attempts", attempt);
                    return Err(HarnessError::NotReady {
                        attempts: attempt,
                        last_error: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = readiness.backoff_after(attempt);
                    debug!("Readiness probe {} failed, retrying in {:?}: {}", attempt, delay, e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn exited_early(&mut self, exit_code: i32, drain_timeout: Duration) -> HarnessError {
        // Already exited; this only waits for the pipes to drain
        if let Err(e) = self.process.wait(drain_timeout).await {
            debug!("Output of exited background process not fully drained: {}", e);
        }
        let output = self.process.combined_output().await;

        if exit_code != 0 {
            return HarnessError::ProcessFailed {
                command: self.process.command().to_string(),
                exit_code,
                stderr: output,
            };
        }
        HarnessError::Lifecycle(format!(
            "{} exited before it became ready. Output was:\n{}\n",
            self.process.command(),
            output
        ))
    }

    /// Command line the process was started with
    pub fn command(&self) -> &str {
        self.process.command()
    }

    /// Lines the process has written to stdout so far
    pub async fn stdout_lines(&self) -> Vec<String> {
        self.process.stdout().await.lines().to_vec()
    }

    /// Send `h2c stop` and wait up to `timeout` for the process to exit with code 0
    pub async fn stop(mut self, h2c: &H2c, timeout: Duration) -> Result<()> {
        h2c.stop().await?;

        let exit_code = match self.process.wait(timeout).await {
            Ok(exit_code) => exit_code,
            Err(e) if e.is_timeout() => {
                warn!("Background process did not exit within {:?}", timeout);
                return Err(HarnessError::StopTimeout {
                    command: self.process.command().to_string(),
                    timeout,
                    output: self.process.combined_output().await,
                });
            }
            Err(e) => return Err(e),
        };
        if exit_code != 0 {
            return Err(HarnessError::ProcessFailed {
                command: self.process.command().to_string(),
                exit_code,
                stderr: self.process.combined_output().await,
            });
        }

        info!("Background process stopped");
        Ok(())
    }
}
