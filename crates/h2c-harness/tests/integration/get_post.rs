//! GET/PUT/POST scenarios driven through the h2c client

use anyhow::{Context, Result};
use h2c_harness::{H2cSession, PayloadFile};
use tokio::sync::Mutex;

use super::utils::{init_tracing, TestTarget, TEST_PATH};

/// One background h2c process connected to one fixture
pub struct GetPostTests {
    session: Mutex<Option<H2cSession>>,
    target: Mutex<Option<TestTarget>>,
}

impl GetPostTests {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
            target: Mutex::new(None),
        }
    }

    /// Start the fixture, then `h2c start` and `h2c connect`
    pub async fn setup(&self) -> Result<()> {
        init_tracing();

        let target = TestTarget::resolve().await?;
        let mut session = H2cSession::new(target.config.clone());
        if let Err(e) = session.set_up().await {
            // A started but unconnected process still has to be stopped.
            if session.is_running() {
                session.tear_down().await.ok();
            }
            target.shutdown().await?;
            return Err(e).context("Failed to start and connect h2c");
        }

        *self.target.lock().await = Some(target);
        *self.session.lock().await = Some(session);
        Ok(())
    }

    /// `h2c stop`, then stop the fixture
    pub async fn cleanup(&self) -> Result<()> {
        if let Some(mut session) = self.session.lock().await.take() {
            session.tear_down().await.context("Failed to stop h2c")?;
        }
        if let Some(target) = self.target.lock().await.take() {
            target.shutdown().await?;
        }
        Ok(())
    }

    pub async fn test_simple_get(&self) -> Result<()> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().context("setup() not called")?;

        let result = session.h2c().get(TEST_PATH).await?;
        result.assert_stdout_contains("Hello, World!")?;
        result.assert_stdout_contains("Btw, this is request number 1.")?;
        Ok(())
    }

    /// Response larger than the initial 65,535 octet flow-control window
    pub async fn test_large_get(&self) -> Result<()> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().context("setup() not called")?;

        let size = 66_000;
        let result = session.h2c().get_sized(TEST_PATH, size).await?;
        result.assert_stdout_contains(&format!("Here are {size} 'a' characters"))?;
        result.assert_stdout_longer_than(size as usize)?;
        Ok(())
    }

    pub async fn test_put(&self) -> Result<()> {
        self.send_payload(24, Method::Put).await
    }

    pub async fn test_small_post(&self) -> Result<()> {
        self.send_payload(27, Method::Post).await
    }

    /// Request body larger than the initial flow-control window
    pub async fn test_large_post(&self) -> Result<()> {
        self.send_payload(65_000, Method::Post).await
    }

    async fn send_payload(&self, len: usize, method: Method) -> Result<()> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().context("setup() not called")?;

        let payload = PayloadFile::zeroed(len)?;
        let result = match method {
            Method::Put => session.h2c().put(payload.path(), TEST_PATH).await?,
            Method::Post => session.h2c().post(payload.path(), TEST_PATH).await?,
        };
        result.assert_stdout_contains(&format!("Received {len} characters."))?;
        payload.delete()?;
        Ok(())
    }
}

enum Method {
    Put,
    Post,
}
