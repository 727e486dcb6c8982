//! Utility functions for integration tests

use std::sync::Once;

use anyhow::{Context, Result};
use h2c_fixture::{FixtureConfig, FixtureServer};
use h2c_harness::{HarnessConfig, HostPolicy};

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "h2c_harness=info,h2c_fixture=info".into()),
            )
            .with_test_writer()
            .init();
    });
}

/// Where the h2c client is pointed during a test
pub struct TestTarget {
    pub config: HarnessConfig,
    /// In-process HTTPS fixture, unless `H2C_TARGET_PORT` names an external one
    pub fixture: Option<FixtureServer>,
}

impl TestTarget {
    pub async fn resolve() -> Result<Self> {
        let config = HarnessConfig::from_env(HostPolicy::Fallback)
            .context("Failed to load harness configuration")?;

        if std::env::var(h2c_harness::config::TARGET_PORT_ENV).is_ok() {
            return Ok(Self {
                config,
                fixture: None,
            });
        }

        let fixture = FixtureServer::bind(FixtureConfig::loopback_tls())
            .await
            .context("Failed to start fixture server")?;
        let config = config.with_port(fixture.port());

        Ok(Self {
            config,
            fixture: Some(fixture),
        })
    }

    pub async fn shutdown(self) -> Result<()> {
        if let Some(fixture) = self.fixture {
            fixture.shutdown().await.context("Failed to stop fixture")?;
        }
        Ok(())
    }
}

/// Endpoint path every scenario talks to
pub const TEST_PATH: &str = "/h2c/test";
