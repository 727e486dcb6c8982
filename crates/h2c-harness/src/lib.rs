//! # h2c harness
//!
//! Drives the h2c command-line client from integration tests.
//!
//! A test starts h2c's persistent background process, connects it to the
//! fixture endpoint, issues one foreground command per request and asserts on
//! the captured output. Every command runs with a deadline; failures carry the
//! command line and the captured output.

#![warn(missing_docs)]

/// Error types for the harness
pub mod error;

/// Line-capturing output sinks
pub mod sink;

/// Foreground command execution
pub mod runner;

/// Typed h2c command lines
pub mod command;

/// h2c client facade
pub mod client;

/// Background process lifecycle
pub mod background;

/// Per-test setup and teardown
pub mod session;

/// Temporary request payloads
pub mod payload;

/// Harness configuration
pub mod config;

pub use error::HarnessError;
pub use sink::{CapturedOutput, OutputSink};
pub use runner::{CommandResult, CommandRunner};
pub use command::H2cCommand;
pub use client::H2c;
pub use background::BackgroundProcess;
pub use session::H2cSession;
pub use payload::PayloadFile;
pub use config::{HarnessConfig, HostPolicy, ReadinessConfig};

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
