//! Stage name resolution
//!
//! Turns a stage name such as `css` into the absolute path of the module
//! implementing it, following the node-style search path the pipeline uses:
//! each ancestor of the base directory is probed for
//! `<ancestor>/<search_dir>/<template(name)>`.

use crate::chain::{StageChain, StageReference, BUILTIN_PREFIX};
use crate::error::ResolutionError;
use crate::fs::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

pub const DEFAULT_SEARCH_DIR: &str = "node_modules";
pub const DEFAULT_TEMPLATES: &[&str] = &["*-loader", "*"];

const SCRIPT_EXTENSION: &str = "js";
const MANIFEST: &str = "package.json";
const INDEX: &str = "index.js";

pub struct StageResolver {
    fs: Arc<dyn FileSystem>,
    search_dir: String,
    templates: Vec<String>,
}

impl StageResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            search_dir: DEFAULT_SEARCH_DIR.to_string(),
            templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_search_dir(mut self, search_dir: impl Into<String>) -> Self {
        self.search_dir = search_dir.into();
        self
    }

    /// Name templates tried in order; `*` stands for the stage name.
    pub fn with_templates(mut self, templates: Vec<String>) -> Self {
        self.templates = templates;
        self
    }

    /// Absolute identifier for `name`, looked up from `base_dir`.
    pub fn resolve_name(&self, name: &str, base_dir: &Path) -> Result<String, ResolutionError> {
        if name.starts_with(BUILTIN_PREFIX) {
            return Ok(name.to_string());
        }

        for candidate in self.candidates(name, base_dir) {
            trace!("Probing {} for stage '{}'", candidate.display(), name);
            if let Some(found) = self.load(name, &candidate)? {
                let found = self.fs.canonicalize(&found).unwrap_or(found);
                debug!("Resolved stage '{}' to {}", name, found.display());
                return Ok(found.display().to_string());
            }
        }

        Err(ResolutionError::NotFound {
            stage: name.to_string(),
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// `stage` with its name replaced by the resolved identifier.
    pub fn resolve(
        &self,
        stage: &StageReference,
        base_dir: &Path,
    ) -> Result<StageReference, ResolutionError> {
        Ok(StageReference {
            name: self.resolve_name(&stage.name, base_dir)?,
            parameters: stage.parameters.clone(),
        })
    }

    /// Resolves every stage of `chain`, keeping its order.
    pub fn resolve_chain(
        &self,
        chain: &StageChain,
        base_dir: &Path,
    ) -> Result<StageChain, ResolutionError> {
        chain
            .iter()
            .map(|stage| self.resolve(stage, base_dir))
            .collect::<Result<Vec<_>, _>>()
            .map(StageChain::from)
    }

    fn candidates(&self, name: &str, base_dir: &Path) -> Vec<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return vec![path.to_path_buf()];
        }
        if name == "." || name == ".." || name.starts_with("./") || name.starts_with("../") {
            return vec![base_dir.join(name)];
        }

        base_dir
            .ancestors()
            .filter(|dir| dir.file_name().map(|n| n != self.search_dir.as_str()).unwrap_or(true))
            .flat_map(|dir| {
                let search = dir.join(&self.search_dir);
                self.templates
                    .iter()
                    .map(move |template| search.join(template.replace('*', name)))
            })
            .collect()
    }

    fn load(&self, stage: &str, candidate: &Path) -> Result<Option<PathBuf>, ResolutionError> {
        if let Some(file) = self.load_file(candidate) {
            return Ok(Some(file));
        }
        if !self.fs.is_dir(candidate) {
            return Ok(None);
        }

        let manifest = candidate.join(MANIFEST);
        if self.fs.is_file(&manifest) {
            if let Some(main) = self.read_main(stage, &manifest)? {
                let entry = candidate.join(main);
                if let Some(file) = self.load_file(&entry) {
                    return Ok(Some(file));
                }
                let index = entry.join(INDEX);
                if self.fs.is_file(&index) {
                    return Ok(Some(index));
                }
            }
        }

        let index = candidate.join(INDEX);
        if self.fs.is_file(&index) {
            return Ok(Some(index));
        }
        Ok(None)
    }

    fn load_file(&self, candidate: &Path) -> Option<PathBuf> {
        if self.fs.is_file(candidate) {
            return Some(candidate.to_path_buf());
        }
        let mut with_ext = candidate.as_os_str().to_owned();
        with_ext.push(".");
        with_ext.push(SCRIPT_EXTENSION);
        let with_ext = PathBuf::from(with_ext);
        self.fs.is_file(&with_ext).then_some(with_ext)
    }

    fn read_main(&self, stage: &str, manifest: &Path) -> Result<Option<String>, ResolutionError> {
        let invalid = |reason: String| ResolutionError::InvalidManifest {
            stage: stage.to_string(),
            manifest: manifest.to_path_buf(),
            reason,
        };

        let content = self
            .fs
            .read_to_string(manifest)
            .map_err(|e| invalid(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        Ok(value
            .get("main")
            .and_then(|main| main.as_str())
            .filter(|main| !main.is_empty())
            .map(str::to_string))
    }
}
