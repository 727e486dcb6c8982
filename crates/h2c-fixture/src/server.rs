//! Router construction and server lifecycle

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::FixtureConfig;
use crate::error::{FixtureError, FixtureResult};
use crate::handlers;
use crate::session::SessionStore;
use crate::tls::TlsMaterial;

/// How long open HTTPS connections may finish after shutdown is requested
const TLS_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Per-client request counters
    pub sessions: SessionStore,
    /// Configuration the server was started with
    pub config: Arc<FixtureConfig>,
}

impl AppState {
    /// State with an empty session store
    pub fn new(config: FixtureConfig) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
///
/// Bodies are unbounded. The same router serves HTTP/1.1 and HTTP/2,
/// negotiated by ALPN over TLS or by prior knowledge in cleartext.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            &state.config.test_path(),
            get(handlers::get_test)
                .post(handlers::post_test)
                .put(handlers::put_test),
        )
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

enum Transport {
    Plain(TcpListener),
    Tls(std::net::TcpListener, RustlsConfig),
}

/// A fixture server running on a background task.
///
/// Dropping the handle stops the server and its session sweeper.
pub struct FixtureServer {
    local_addr: SocketAddr,
    test_path: String,
    tls: Option<TlsMaterial>,
    shutdown: Option<oneshot::Sender<()>>,
    serve: Option<JoinHandle<std::io::Result<()>>>,
    sweeper: JoinHandle<()>,
}

impl FixtureServer {
    /// Bind the listener and start serving, over TLS when `config.tls` is set.
    pub async fn bind(config: FixtureConfig) -> FixtureResult<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        let local_addr = listener.local_addr()?;
        let test_path = config.test_path();
        let sweep_interval = config.sweep_interval;
        let tls = if config.tls {
            Some(TlsMaterial::self_signed(&config.host)?)
        } else {
            None
        };
        let transport = match &tls {
            Some(material) => Transport::Tls(listener.into_std()?, material.rustls_config().await?),
            None => Transport::Plain(listener),
        };

        let state = AppState::new(config);
        let sweeper = state.sessions.spawn_sweeper(sweep_interval);
        let app = router(state);

        let (tx, rx) = oneshot::channel::<()>();
        let serve = match transport {
            Transport::Tls(listener, rustls) => {
                let handle = axum_server::Handle::new();
                let server = axum_server::from_tcp_rustls(listener, rustls).handle(handle.clone());

                tokio::spawn(async move {
                    let serving = server.serve(app.into_make_service());
                    tokio::pin!(serving);
                    tokio::select! {
                        result = &mut serving => result,
                        _ = rx => {
                            handle.graceful_shutdown(Some(TLS_GRACE_PERIOD));
                            serving.await
                        }
                    }
                })
            }
            Transport::Plain(listener) => tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        rx.await.ok();
                    })
                    .await
            }),
        };

        let scheme = if tls.is_some() { "https" } else { "http" };
        tracing::info!("Fixture listening on {scheme}://{local_addr}{test_path}");

        Ok(Self {
            local_addr,
            test_path,
            tls,
            shutdown: Some(tx),
            serve: Some(serve),
            sweeper,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Bound port, useful when the configured port was `0`
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Path of the test endpoint, e.g. `/h2c/test`
    pub fn test_path(&self) -> &str {
        &self.test_path
    }

    /// PEM certificate of the HTTPS listener; `None` for cleartext
    pub fn cert_pem(&self) -> Option<&str> {
        self.tls.as_ref().map(TlsMaterial::cert_pem)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> FixtureResult<()> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        self.sweeper.abort();

        match self.serve.take() {
            Some(serve) => serve
                .await
                .map_err(|e| FixtureError::Io(std::io::Error::other(e)))?
                .map_err(FixtureError::from),
            None => Ok(()),
        }
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        self.sweeper.abort();
    }
}

/// Serve until `signal` resolves, then shut down gracefully.
pub async fn run<F>(config: FixtureConfig, signal: F) -> FixtureResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server = FixtureServer::bind(config).await?;
    signal.await;
    tracing::info!("Shutting down fixture on {}", server.local_addr());
    server.shutdown().await
}
