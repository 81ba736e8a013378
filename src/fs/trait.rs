//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Abstraction over the file system probes the compiler and the discovery
/// host perform, so both can run against an in-memory tree in tests.
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Every file below `root`, recursively, hidden entries included.
    /// Fails if `root` itself cannot be read.
    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>>;

    /// Canonicalize a path
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}
