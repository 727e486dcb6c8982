//! Harness configuration and target host discovery

use crate::{HarnessError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the h2c binary
pub const BINARY_ENV: &str = "H2C_BINARY";
/// Environment variable naming the fixture port
pub const TARGET_PORT_ENV: &str = "H2C_TARGET_PORT";
/// Environment variable used for host discovery
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

/// What to do when no Docker host is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostPolicy {
    /// Assume the fixture runs natively and use `localhost`
    #[default]
    Fallback,
    /// Refuse to run without an explicit Docker host
    Required,
}

/// Resolve the fixture host from a `DOCKER_HOST`-style value.
///
/// `tcp://192.168.59.103:2376` resolves to `192.168.59.103`. A `unix://`
/// socket means the daemon runs natively, so the fixture is on `localhost`.
/// An absent value is handled according to `policy`.
pub fn resolve_host(docker_host: Option<&str>, policy: HostPolicy) -> Result<String> {
    let docker_host = match docker_host.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) => host,
        None => {
            return match policy {
                HostPolicy::Fallback => Ok("localhost".to_string()),
                HostPolicy::Required => Err(HarnessError::Configuration(format!(
                    "{} is not set",
                    DOCKER_HOST_ENV
                ))),
            }
        }
    };

    if docker_host.starts_with("unix://") {
        return Ok("localhost".to_string());
    }

    let without_scheme = match docker_host.find("://") {
        Some(pos) => &docker_host[pos + 3..],
        None => docker_host,
    };
    let without_scheme = without_scheme.trim_end_matches('/');
    let host = match without_scheme.rfind(':') {
        Some(pos) if without_scheme[pos + 1..].chars().all(|c| c.is_ascii_digit()) => {
            &without_scheme[..pos]
        }
        _ => without_scheme,
    };

    if host.is_empty() {
        return Err(HarnessError::Configuration(format!(
            "{} has no host part: {}",
            DOCKER_HOST_ENV, docker_host
        )));
    }

    Ok(host.to_string())
}

/// Readiness probe settings for the background process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Maximum number of probes
    pub max_attempts: u32,
    /// Delay before the second probe
    pub initial_backoff: Duration,
    /// Upper bound for the delay between probes
    pub max_backoff: Duration,
    /// Timeout for a single probe command
    pub probe_timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(800),
            probe_timeout: Duration::from_secs(1),
        }
    }
}

impl ReadinessConfig {
    /// Delay to wait after the given (1-based) failed attempt
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Path or name of the h2c binary
    pub binary: PathBuf,
    /// Arguments inserted between the binary and each h2c command
    pub binary_args: Vec<String>,
    /// Host the fixture is reachable on
    pub host: String,
    /// Port the fixture listens on
    pub port: u16,
    /// Timeout for each foreground command
    pub command_timeout: Duration,
    /// How long `stop` waits for the background process to exit
    pub stop_timeout: Duration,
    /// Background process readiness probe
    pub readiness: ReadinessConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("h2c"),
            binary_args: Vec::new(),
            host: "localhost".to_string(),
            port: 8443,
            command_timeout: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(1),
            readiness: ReadinessConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Build a configuration from explicit inputs
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Load configuration from the environment.
    ///
    /// | Env Var           | Default              |
    /// |-------------------|----------------------|
    /// | `H2C_BINARY`      | `h2c`                |
    /// | `H2C_TARGET_PORT` | `8443`               |
    /// | `DOCKER_HOST`     | handled by `policy`  |
    pub fn from_env(policy: HostPolicy) -> Result<Self> {
        let docker_host = std::env::var(DOCKER_HOST_ENV).ok();
        let host = resolve_host(docker_host.as_deref(), policy)?;

        let mut config = Self {
            host,
            ..Default::default()
        };

        if let Ok(binary) = std::env::var(BINARY_ENV) {
            config.binary = PathBuf::from(binary);
        }

        if let Ok(port) = std::env::var(TARGET_PORT_ENV) {
            config.port = port.trim().parse().map_err(|_| {
                HarnessError::Configuration(format!(
                    "{} must be a valid port, got {:?}",
                    TARGET_PORT_ENV, port
                ))
            })?;
        }

        Ok(config)
    }

    /// Set the h2c binary
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run h2c through a wrapper, e.g. `docker exec <container> h2c`
    pub fn with_binary_args(mut self, args: Vec<String>) -> Self {
        self.binary_args = args;
        self
    }

    /// Set the fixture port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the stop timeout
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Set the readiness probe settings
    pub fn with_readiness(mut self, readiness: ReadinessConfig) -> Self {
        self.readiness = readiness;
        self
    }

    /// `host:port` as passed to `h2c connect`
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
