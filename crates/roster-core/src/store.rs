//! Where the encoded query state lives between runs: the address-bar
//! equivalent.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read/write access to the persisted URL fragment.
pub trait UrlStateStore {
    /// Current fragment; empty when nothing has been stored.
    fn read(&self) -> Result<String>;

    /// Replace the stored fragment.
    fn write(&mut self, fragment: &str) -> Result<()>;
}

/// In-memory store for tests and embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryUrlStore {
    fragment: String,
    writes: usize,
}

impl MemoryUrlStore {
    #[must_use]
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            writes: 0,
        }
    }

    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// How many times the fragment has been written.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl UrlStateStore for MemoryUrlStore {
    fn read(&self) -> Result<String> {
        Ok(self.fragment.clone())
    }

    fn write(&mut self, fragment: &str) -> Result<()> {
        fragment.clone_into(&mut self.fragment);
        self.writes += 1;
        Ok(())
    }
}

/// Store that keeps the fragment in a single text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUrlStore {
    path: PathBuf,
}

impl FileUrlStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UrlStateStore for FileUrlStore {
    fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(content.trim().to_string())
    }

    fn write(&mut self, fragment: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, format!("{fragment}\n"))
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
