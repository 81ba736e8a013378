use super::FileSystem;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        // Probe the root first so an unreadable scope is an error rather than
        // an empty walk.
        fs::read_dir(root).context(format!("Failed to read directory {:?}", root))?;

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        path.canonicalize()
            .context(format!("Failed to canonicalize path {:?}", path))
    }
}
