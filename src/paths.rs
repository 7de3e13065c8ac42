//! Path and resource primitives
//!
//! Ordered search-path lists, the session temporary directory and the small
//! file loaders used by the driver.

use indexmap::IndexSet;
use itertools::Itertools;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every session temporary directory.
pub const TMP_DIR_PREFIX: &str = "cjit-";

/// Ordered, de-duplicating list of search directories.
///
/// Insertion order is search order. Adding a path that is already present
/// keeps the first occurrence, except for [`PathList::prepend`] which moves
/// the path to the front.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathList {
    paths: IndexSet<PathBuf>,
}

impl PathList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path`, returning `false` when it was already listed.
    pub fn append(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Put `path` first, moving it there if it was already listed.
    pub fn prepend(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.paths.shift_remove(&path);
        self.paths.shift_insert(0, path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Render the list with the platform path separator, for status output.
    pub fn joined(&self) -> String {
        let sep = if cfg!(windows) { ";" } else { ":" };
        self.paths.iter().map(|p| p.display()).join(sep)
    }
}

/// Create a fresh, uniquely named temporary directory.
pub fn create_tmp_dir() -> io::Result<TempDir> {
    tempfile::Builder::new().prefix(TMP_DIR_PREFIX).tempdir()
}

/// Load a whole file into memory.
pub fn load_file(path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// Read everything from `reader`; no encoding is assumed.
pub fn load_all(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut code = Vec::new();
    reader.read_to_end(&mut code)?;
    Ok(code)
}
