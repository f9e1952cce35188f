use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{CommonError, CommonResult};

/// Source of opaque byte content, addressed by an identifier (usually a path)
///
/// Used by the bytes-field "replace whole value" operation. Implementations
/// may block; the engine treats them as plain synchronous calls.
pub trait ByteSource {
    /// Read the complete contents behind `identifier`
    fn read_all(&self, identifier: &str) -> CommonResult<Vec<u8>>;
}

/// Real file system implementation
///
/// Only regular, readable files are accepted; directories and missing paths
/// are reported as `NotFound`.
#[derive(Debug, Default, Clone)]
pub struct FileByteSource {
    /// Relative identifiers are resolved against this directory
    pub base_dir: Option<PathBuf>,
}

impl FileByteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ByteSource for FileByteSource {
    fn read_all(&self, identifier: &str) -> CommonResult<Vec<u8>> {
        let path = self.resolve(identifier);
        if !path.is_file() {
            return Err(CommonError::NotFound(path.display().to_string()));
        }

        let data = std::fs::read(&path)?;
        debug!(path = %path.display(), bytes = data.len(), "Read byte source");
        Ok(data)
    }
}

/// In-memory byte source for testing
#[derive(Debug, Default, Clone)]
pub struct MemoryByteSource {
    pub entries: HashMap<String, Vec<u8>>,
}

impl MemoryByteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, identifier: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(identifier.into(), data.into());
    }
}

impl ByteSource for MemoryByteSource {
    fn read_all(&self, identifier: &str) -> CommonResult<Vec<u8>> {
        self.entries
            .get(identifier)
            .cloned()
            .ok_or_else(|| CommonError::NotFound(identifier.to_string()))
    }
}
