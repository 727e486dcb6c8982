//! Temporary request bodies for PUT and POST

use crate::Result;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// A temporary file of a fixed size, removed on drop
#[derive(Debug)]
pub struct PayloadFile {
    file: NamedTempFile,
    len: usize,
}

impl PayloadFile {
    /// Create a file containing `len` zero bytes
    pub fn zeroed(len: usize) -> Result<Self> {
        Self::with_content(&vec![0u8; len])
    }

    /// Create a file containing `content`
    pub fn with_content(content: &[u8]) -> Result<Self> {
        let mut file = Builder::new()
            .prefix("h2c-test-data-")
            .suffix(".dat")
            .tempfile()?;
        file.write_all(content)?;
        file.flush()?;
        Ok(Self {
            file,
            len: content.len(),
        })
    }

    /// Location of the payload on disk
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the file now, surfacing any error
    pub fn delete(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_payload_has_requested_size() {
        let payload = PayloadFile::zeroed(65000).unwrap();
        let metadata = std::fs::metadata(payload.path()).unwrap();

        assert_eq!(metadata.len(), 65000);
        assert_eq!(payload.len(), 65000);
        assert!(!payload.is_empty());

        let name = payload.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("h2c-test-data-"));
        assert!(name.ends_with(".dat"));
    }

    #[test]
    fn test_delete_removes_file() {
        let payload = PayloadFile::with_content(b"hello").unwrap();
        let path = payload.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        payload.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let path = {
            let payload = PayloadFile::zeroed(0).unwrap();
            assert!(payload.is_empty());
            payload.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
