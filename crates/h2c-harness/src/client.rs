//! Foreground h2c commands

use crate::command::{sized_path, H2cCommand};
use crate::runner::{CommandResult, CommandRunner};
use crate::{BackgroundProcess, HarnessConfig, Result};
use std::path::Path;
use std::time::Duration;

/// Issues h2c commands against the running background process.
///
/// Every call is bounded by the configured command timeout and fails unless
/// h2c exits with code 0.
#[derive(Debug, Clone)]
pub struct H2c {
    runner: CommandRunner,
    config: HarnessConfig,
}

impl H2c {
    /// Create a client from configuration
    pub fn new(config: HarnessConfig) -> Self {
        let runner = CommandRunner::new(config.binary.clone())
            .with_base_args(config.binary_args.clone());
        Self { runner, config }
    }

    /// Active configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub(crate) fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Run `command` with the configured timeout
    pub async fn run(&self, command: &H2cCommand) -> Result<CommandResult> {
        self.run_with_timeout(command, self.config.command_timeout).await
    }

    /// Run `command` with an explicit timeout
    pub async fn run_with_timeout(
        &self,
        command: &H2cCommand,
        timeout: Duration,
    ) -> Result<CommandResult> {
        self.runner.run(&command.args(), timeout).await
    }

    /// Start the persistent h2c process and wait until it answers
    pub async fn start_background(&self) -> Result<BackgroundProcess> {
        BackgroundProcess::start(self).await
    }

    /// Connect to the configured fixture
    pub async fn connect(&self) -> Result<CommandResult> {
        self.connect_to(&self.config.authority()).await
    }

    /// Connect to an explicit `host:port`
    pub async fn connect_to(&self, authority: &str) -> Result<CommandResult> {
        self.run(&H2cCommand::Connect {
            authority: authority.to_string(),
        })
        .await
    }

    /// Drop the current connection
    pub async fn disconnect(&self) -> Result<CommandResult> {
        self.run(&H2cCommand::Disconnect).await
    }

    /// GET `path`
    pub async fn get(&self, path: &str) -> Result<CommandResult> {
        self.run(&H2cCommand::Get {
            path: path.to_string(),
        })
        .await
    }

    /// GET `path?size=<size>`
    pub async fn get_sized(&self, path: &str, size: i64) -> Result<CommandResult> {
        self.get(&sized_path(path, size)).await
    }

    /// PUT the contents of `file` to `path`
    pub async fn put(&self, file: &Path, path: &str) -> Result<CommandResult> {
        self.run(&H2cCommand::Put {
            file: file.to_path_buf(),
            path: path.to_string(),
        })
        .await
    }

    /// POST the contents of `file` to `path`
    pub async fn post(&self, file: &Path, path: &str) -> Result<CommandResult> {
        self.run(&H2cCommand::Post {
            file: file.to_path_buf(),
            path: path.to_string(),
        })
        .await
    }

    /// Send `name: value` with every subsequent request
    pub async fn set_header(&self, name: &str, value: &str) -> Result<CommandResult> {
        self.run(&H2cCommand::Set {
            name: name.to_string(),
            value: value.to_string(),
        })
        .await
    }

    /// Stop sending a header, or only one of its values
    pub async fn unset_header(&self, name: &str, value: Option<&str>) -> Result<CommandResult> {
        self.run(&H2cCommand::Unset {
            name: name.to_string(),
            value: value.map(str::to_string),
        })
        .await
    }

    /// Send ping frames
    pub async fn ping(&self) -> Result<CommandResult> {
        self.run(&H2cCommand::Ping).await
    }

    /// Process id of the background process
    pub async fn pid(&self) -> Result<u32> {
        let result = self.run(&H2cCommand::Pid).await?;
        parse_pid(&result)
    }

    /// Stream overview of the current connection
    pub async fn stream_info(&self) -> Result<CommandResult> {
        self.run(&H2cCommand::StreamInfo).await
    }

    /// Responses available as push promises
    pub async fn push_list(&self) -> Result<CommandResult> {
        self.run(&H2cCommand::PushList).await
    }

    /// h2c version string
    pub async fn version(&self) -> Result<String> {
        let result = self.run(&H2cCommand::Version).await?;
        Ok(result.stdout().trim().to_string())
    }

    /// Ask the background process to shut down
    pub async fn stop(&self) -> Result<CommandResult> {
        self.run(&H2cCommand::Stop).await
    }
}

fn parse_pid(result: &CommandResult) -> Result<u32> {
    let stdout = result.stdout();
    stdout.trim().parse().map_err(|_| crate::HarnessError::Assertion {
        command: result.command().to_string(),
        expectation: "Expected a process id".to_string(),
        stdout,
    })
}
