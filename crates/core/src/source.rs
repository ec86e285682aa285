//! Source provider abstraction for loading rule sets.
//!
//! The [`SourceProvider`] trait abstracts file I/O so rule sets can be
//! loaded from disk or from memory (tests, embedding hosts).

use crate::ast::RuleSet;
use crate::error::LoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Trait that abstracts reading rule-set documents.
pub trait SourceProvider {
    /// Read the source text for a given path. Returns the content as a String.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;
}

/// Default filesystem-backed source provider.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }
}

/// In-memory source provider keyed by path.
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        Self { files }
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", path.display()),
            )
        })
    }
}

/// Reads and parses a JSON rule set.
pub fn load_rules(provider: &dyn SourceProvider, path: &Path) -> Result<RuleSet, LoadError> {
    let text = provider.read_source(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })
}
