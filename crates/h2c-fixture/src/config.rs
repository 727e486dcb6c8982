//! Fixture server configuration

use std::time::Duration;

use crate::error::{FixtureError, FixtureResult};

/// Fixture server configuration loaded from environment variables.
///
/// Defaults match a servlet container serving the `h2c` web archive.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8443`). `0` picks a free port.
    pub port: u16,
    /// Path prefix the endpoint is mounted under (default: `/h2c`).
    pub context_path: String,
    /// Idle time after which a session and its counter are dropped.
    pub session_ttl: Duration,
    /// How often expired sessions are swept.
    pub sweep_interval: Duration,
    /// Largest accepted `size` query parameter.
    pub max_size: u64,
    /// Serve HTTPS with a self-signed certificate and ALPN `h2` (default:
    /// `true`). Otherwise serve cleartext HTTP/1.1 and HTTP/2 with prior
    /// knowledge.
    pub tls: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8443,
            context_path: "/h2c".to_string(),
            session_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            max_size: 64 * 1024 * 1024,
            tls: true,
        }
    }
}

impl FixtureConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default    |
    /// |--------------------------------|------------|
    /// | `H2C_FIXTURE_HOST`             | `0.0.0.0`  |
    /// | `H2C_FIXTURE_PORT`             | `8443`     |
    /// | `H2C_FIXTURE_CONTEXT_PATH`     | `/h2c`     |
    /// | `H2C_FIXTURE_SESSION_TTL_SECS` | `1800`     |
    /// | `H2C_FIXTURE_MAX_SIZE`         | `67108864` |
    /// | `H2C_FIXTURE_TLS`              | `true`     |
    pub fn from_env() -> FixtureResult<Self> {
        let defaults = Self::default();

        let host = std::env::var("H2C_FIXTURE_HOST").unwrap_or(defaults.host);
        let port = parse_env("H2C_FIXTURE_PORT", defaults.port)?;
        let context_path = std::env::var("H2C_FIXTURE_CONTEXT_PATH")
            .map(|p| normalize_context_path(&p))
            .unwrap_or(defaults.context_path);
        let session_ttl = parse_env("H2C_FIXTURE_SESSION_TTL_SECS", defaults.session_ttl.as_secs())
            .map(Duration::from_secs)?;
        let max_size = parse_env("H2C_FIXTURE_MAX_SIZE", defaults.max_size)?;
        let tls = parse_env("H2C_FIXTURE_TLS", defaults.tls)?;

        Ok(Self {
            host,
            port,
            context_path,
            session_ttl,
            sweep_interval: defaults.sweep_interval,
            max_size,
            tls,
        })
    }

    /// Cleartext loopback configuration on a free port, for tests
    pub fn loopback() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            tls: false,
            ..Default::default()
        }
    }

    /// HTTPS loopback configuration on a free port, for tests
    pub fn loopback_tls() -> Self {
        Self {
            tls: true,
            ..Self::loopback()
        }
    }

    /// Path of the test endpoint, e.g. `/h2c/test`
    pub fn test_path(&self) -> String {
        format!("{}/test", self.context_path)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> FixtureResult<T> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| FixtureError::Configuration(format!("{name} has an invalid value {value:?}"))),
        Err(_) => Ok(default),
    }
}

/// `h2c/`, `/h2c` and `/h2c/` all become `/h2c`; an empty path stays empty
fn normalize_context_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
