//! Per-test setup and teardown around one background process

use crate::{BackgroundProcess, H2c, HarnessConfig, HarnessError, Result};

/// Brackets a test with `h2c start` + `h2c connect` and `h2c stop`.
///
/// At most one background process is live at a time: `set_up` refuses to
/// run while the previous one has not been torn down.
pub struct H2cSession {
    h2c: H2c,
    background: Option<BackgroundProcess>,
}

impl H2cSession {
    /// Create a session that has not been set up yet
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            h2c: H2c::new(config),
            background: None,
        }
    }

    /// Client for foreground commands
    pub fn h2c(&self) -> &H2c {
        &self.h2c
    }

    /// Whether a background process is live
    pub fn is_running(&self) -> bool {
        self.background.is_some()
    }

    /// Start the background process and connect it to the fixture.
    ///
    /// If connecting fails the process stays registered so that
    /// `tear_down` can still stop it.
    pub async fn set_up(&mut self) -> Result<()> {
        if self.background.is_some() {
            return Err(HarnessError::Lifecycle(
                "previous background process was not torn down".to_string(),
            ));
        }

        self.background = Some(self.h2c.start_background().await?);
        self.h2c.connect().await?;
        Ok(())
    }

    /// Stop the background process and wait for it to exit
    pub async fn tear_down(&mut self) -> Result<()> {
        let background = self.background.take().ok_or_else(|| {
            HarnessError::Lifecycle("no background process to tear down".to_string())
        })?;
        background
            .stop(&self.h2c, self.h2c.config().stop_timeout)
            .await
    }
}
