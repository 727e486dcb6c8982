//! Response bodies and request body character counting

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use bytes::{BufMut, Bytes, BytesMut};

/// Filler characters per line.
pub const FILLER_LINE_WIDTH: usize = 80;

/// Body of a GET response.
///
/// The filler section is present only for a positive `size`.
pub fn greeting(request_number: u64, size: i64) -> Bytes {
    let mut body = BytesMut::new();
    body.put_slice(b"Hello, World!\n");
    body.put_slice(format!("Btw, this is request number {request_number}.\n").as_bytes());

    if size > 0 {
        let size = size as usize;
        body.put_slice(format!("Here are {size} 'a' characters\n").as_bytes());
        body.reserve(size + size / FILLER_LINE_WIDTH);
        for i in 1..=size {
            body.put_u8(b'a');
            if i % FILLER_LINE_WIDTH == 0 {
                body.put_u8(b'\n');
            }
        }
    }

    body.freeze()
}

/// Body of a POST or PUT response.
pub fn received(characters: u64) -> String {
    format!("Received {characters} characters.\n")
}

/// How request body bytes map to characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// One character per UTF-16 code unit of the decoded text.
    Utf8,
    /// One character per byte. Used when no charset is declared.
    Latin1,
}

impl Charset {
    /// Charset declared in the `Content-Type` header, defaulting to ISO-8859-1.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_param)
            .map(|name| {
                if name.eq_ignore_ascii_case("utf-8") || name.eq_ignore_ascii_case("utf8") {
                    Charset::Utf8
                } else {
                    Charset::Latin1
                }
            })
            .unwrap_or(Charset::Latin1)
    }
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Streaming character counter fed one body frame at a time.
///
/// Counts match a servlet reading the body as `char`s. For UTF-8 that is one
/// per UTF-16 code unit: continuation bytes are skipped and a four-byte
/// sequence counts twice. A character split across frames is still counted
/// once. Invalid sequences count per leading byte.
#[derive(Debug)]
pub struct CharCounter {
    charset: Charset,
    count: u64,
}

impl CharCounter {
    /// Counter starting at zero
    pub fn new(charset: Charset) -> Self {
        Self { charset, count: 0 }
    }

    /// Add the characters in `chunk`
    pub fn feed(&mut self, chunk: &[u8]) {
        let n = match self.charset {
            Charset::Latin1 => chunk.len(),
            Charset::Utf8 => chunk
                .iter()
                .map(|&b| match b {
                    0x80..=0xBF => 0,
                    0xF0..=0xFF => 2,
                    _ => 1,
                })
                .sum::<usize>(),
        };
        self.count += n as u64;
    }

    /// Characters seen so far
    pub fn count(&self) -> u64 {
        self.count
    }
}
