//! File access used by the resolver.
//!
//! The resolver never touches the filesystem directly. It reads through a
//! [`FileSource`], so documents can also be resolved from memory:
//!
//! - [`DiskSource`]: the real filesystem
//! - [`MemorySource`]: a fixed set of named files

use std::collections::HashMap;
use std::fs;
use std::io;

/// Reads whole files by name.
pub trait FileSource {
    /// Read `path` as UTF-8 text.
    ///
    /// A missing file must be reported with [`io::ErrorKind::NotFound`] so
    /// it can be told apart from other read failures.
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl FileSource for DiskSource {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Serves files from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl FileSource for MemorySource {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{path}: no such file"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new();
        source.insert("a.yaml", "x: 1\n");
        assert_eq!(source.read_to_string("a.yaml").unwrap(), "x: 1\n");
        let err = source.read_to_string("b.yaml").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_disk_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = DiskSource
            .read_to_string(&missing.to_string_lossy())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
