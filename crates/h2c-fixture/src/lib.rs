//! # h2c fixture
//!
//! Minimal HTTP endpoint the h2c client is exercised against. `GET` answers
//! with a greeting and a per-session request number, optionally followed by
//! filler; `POST` and `PUT` report how many characters the body held.
//!
//! By default the listener speaks HTTPS with a self-signed certificate and
//! negotiates HTTP/2 through ALPN, which is what the h2c client expects.

#![warn(missing_docs)]

pub mod body;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod session;
pub mod tls;

pub use config::FixtureConfig;
pub use error::{FixtureError, FixtureResult};
pub use server::{router, run, AppState, FixtureServer};
pub use session::{SessionStore, SESSION_COOKIE};
pub use tls::TlsMaterial;
