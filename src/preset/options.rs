//! User options file: shape and loading

use crate::error::ConfigError;
use crate::fs::FileSystem;
use crate::rules::RuleTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_OPTIONS_FILE: &str = "derive.config.json";

/// Options as written by the user. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserOptions {
    #[serde(default)]
    pub context: Option<PathBuf>,
    #[serde(default)]
    pub module: Option<ModuleOptions>,
    #[serde(default)]
    pub entry: Option<EntryOption>,
    #[serde(default)]
    pub output: Option<OutputOption>,
    #[serde(default)]
    pub plugins: Option<Vec<Value>>,
    /// Diagnostic-map mode.
    #[serde(default)]
    pub devtool: Option<String>,
    /// Pattern-keyed chains to prefetch before the build graph is walked.
    #[serde(default)]
    pub prefetch: Option<RuleTable>,
    /// Keys this crate does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOptions {
    #[serde(default)]
    pub loaders: Option<RuleTable>,
    #[serde(default, rename = "preLoaders")]
    pub pre_loaders: Option<RuleTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryPoints {
    Single(String),
    List(Vec<String>),
}

impl EntryPoints {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            EntryPoints::Single(entry) => vec![entry],
            EntryPoints::List(entries) => entries,
        }
    }
}

/// `entry` as written: a path, a list, or named entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryOption {
    Points(EntryPoints),
    Named(IndexMap<String, EntryPoints>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputObject {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub rest: IndexMap<String, Value>,
}

/// `output` as written: a bare path or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputOption {
    Path(String),
    Object(OutputObject),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionsFormat {
    Json,
    Yaml,
    Toml,
}

impl OptionsFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(OptionsFormat::Json),
            Some("yaml") | Some("yml") => Some(OptionsFormat::Yaml),
            Some("toml") => Some(OptionsFormat::Toml),
            _ => None,
        }
    }
}

/// Parses options text in the format implied by `path`'s extension.
pub fn parse_options(path: &Path, content: &str) -> Result<UserOptions, ConfigError> {
    let format = OptionsFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let invalid = |reason: String| ConfigError::InvalidOptions {
        path: path.to_path_buf(),
        reason,
    };

    match format {
        OptionsFormat::Json => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
        OptionsFormat::Yaml => serde_yaml::from_str(content).map_err(|e| invalid(e.to_string())),
        OptionsFormat::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string())),
    }
}

/// Loads `reference` relative to `context`. A missing file is not an error.
pub fn load_options(
    fs: &dyn FileSystem,
    context: &Path,
    reference: &Path,
) -> Result<Option<UserOptions>, ConfigError> {
    let filename = context.join(reference);
    if !fs.exists(&filename) {
        debug!("No options file at {}, using defaults", filename.display());
        return Ok(None);
    }

    let content = fs
        .read_to_string(&filename)
        .map_err(|e| ConfigError::InvalidOptions {
            path: filename.clone(),
            reason: format!("{:#}", e),
        })?;

    debug!("Loading options from {}", filename.display());
    parse_options(&filename, &content).map(Some)
}
