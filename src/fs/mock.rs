use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
struct MockEntry {
    content: Option<String>,
    kind: EntryKind,
}

/// In-memory tree. Relative paths are rooted at `/mock` unless another root
/// is given.
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, MockEntry>>,
    unreadable: RwLock<HashSet<PathBuf>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            unreadable: RwLock::new(HashSet::new()),
            root,
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                kind: EntryKind::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();
        Self::ensure_parents(&mut files, &path);
    }

    /// Marks a directory so that listing it fails, as a permission error would.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.add_dir(&path);
        self.unreadable.write().unwrap().insert(path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(files: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                kind: EntryKind::Directory,
            });
        }
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        let files = self.files.read().unwrap();
        match files.get(path) {
            None => Err(anyhow!("Directory not found: {:?}", path)),
            Some(entry) if entry.kind != EntryKind::Directory => {
                Err(anyhow!("Not a directory: {:?}", path))
            }
            Some(_) if self.unreadable.read().unwrap().contains(path) => {
                Err(anyhow!("Permission denied: {:?}", path))
            }
            Some(_) => Ok(()),
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files.read().unwrap().contains_key(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.kind == EntryKind::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.kind == EntryKind::File)
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = self.normalize_path(root);
        self.check_readable(&root)?;

        let files = self.files.read().unwrap();
        Ok(files
            .iter()
            .filter(|(path, entry)| entry.kind == EntryKind::File && path.starts_with(&root))
            .map(|(path, _)| path.clone())
            .collect())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let normalized = self.normalize_path(path);
        if self.files.read().unwrap().contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(anyhow!("Path not found: {:?}", path))
        }
    }
}
