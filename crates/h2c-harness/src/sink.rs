//! Line-capturing output sink
//!
//! Raw chunks read from a child's pipe are split on `\n` and appended to an
//! ordered line list. Readers can take a snapshot at any time, including while
//! the pump is still feeding the sink.

use bytes::BytesMut;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

const PUMP_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Default)]
struct SinkState {
    /// Completed lines in arrival order
    lines: Vec<String>,
    /// Bytes after the last newline seen so far
    pending: BytesMut,
}

/// Append-only sink that turns a byte stream into lines
#[derive(Debug, Clone, Default)]
pub struct OutputSink {
    state: Arc<RwLock<SinkState>>,
}

impl OutputSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk; every complete line it closes is appended
    pub async fn feed(&self, chunk: &[u8]) {
        let mut state = self.state.write().await;
        state.pending.extend_from_slice(chunk);

        while let Some(pos) = state.pending.iter().position(|b| *b == b'\n') {
            let raw = state.pending.split_to(pos + 1);
            let line = decode_line(&raw[..pos]);
            state.lines.push(line);
        }
    }

    /// Flush an unterminated trailing line, if any
    pub async fn finish(&self) {
        let mut state = self.state.write().await;
        if !state.pending.is_empty() {
            let raw = state.pending.split();
            let line = decode_line(&raw);
            state.lines.push(line);
        }
    }

    /// All lines captured so far
    pub async fn lines(&self) -> Vec<String> {
        self.state.read().await.lines.clone()
    }

    /// Freeze the current contents
    pub async fn snapshot(&self) -> CapturedOutput {
        CapturedOutput::new(self.lines().await)
    }

    /// Read `reader` to the end, feeding every chunk into the sink.
    ///
    /// The trailing partial line is flushed even when the read fails.
    pub async fn pump<R>(&self, mut reader: R) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; PUMP_BUFFER_SIZE];
        let result = loop {
            match reader.read(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(n) => self.feed(&buf[..n]).await,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        self.finish().await;
        result
    }

    /// Pump `reader` on a separate task
    pub fn spawn_pump<R>(&self, reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let sink = self.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.pump(reader).await {
                debug!("Output pump stopped early: {}", e);
            }
        })
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Immutable sequence of lines captured from one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    lines: Vec<String>,
}

impl CapturedOutput {
    /// Wrap already captured lines
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Captured lines in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the joined text contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
