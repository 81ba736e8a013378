//! Runtime settings for derivekit
//!
//! Settings come from environment variables with fallback defaults; the CLI
//! overrides individual values afterwards.
//!
//! # Environment Variables
//!
//! - `DERIVEKIT_OPTIONS_FILE`: options file name under the context - default: "derive.config.json"
//! - `DERIVEKIT_DEPENDENCY_DIR`: directory non-global rules skip - default: "node_modules"
//! - `DERIVEKIT_STAGE_SEARCH_DIR`: directory searched for stage modules - default: "node_modules"
//! - `DERIVEKIT_STAGE_TEMPLATES`: comma-separated name templates - default: "*-loader,*"
//! - `DERIVEKIT_LOG_LEVEL`: logging level - default: "info"
//! - `DERIVEKIT_LOG_JSON`: JSON log output (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use derivekit::DerivekitConfig;
//! use std::sync::Arc;
//!
//! let config = DerivekitConfig::from_env().expect("Invalid environment");
//! config.validate().expect("Invalid configuration");
//! let merger = config.merger(Arc::new(derivekit::fs::RealFileSystem::new()), false);
//! ```

use crate::error::ConfigError;
use crate::fs::FileSystem;
use crate::preset::{PresetMerger, DEFAULT_OPTIONS_FILE};
use crate::resolve::{StageResolver, DEFAULT_SEARCH_DIR, DEFAULT_TEMPLATES};
use crate::rules::DEFAULT_DEPENDENCY_DIR;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_OPTIONS_FILE: &str = "DERIVEKIT_OPTIONS_FILE";
const ENV_DEPENDENCY_DIR: &str = "DERIVEKIT_DEPENDENCY_DIR";
const ENV_STAGE_SEARCH_DIR: &str = "DERIVEKIT_STAGE_SEARCH_DIR";
const ENV_STAGE_TEMPLATES: &str = "DERIVEKIT_STAGE_TEMPLATES";
const ENV_LOG_LEVEL: &str = "DERIVEKIT_LOG_LEVEL";
const ENV_LOG_JSON: &str = "DERIVEKIT_LOG_JSON";

#[derive(Debug, Clone, PartialEq)]
pub struct DerivekitConfig {
    /// Options file, relative to the context unless absolute
    pub options_file: PathBuf,

    /// Directory name non-global rules never match inside
    pub dependency_dir: String,

    /// Directory probed at each ancestor when resolving stage names
    pub stage_search_dir: String,

    /// Stage name templates, `*` replaced by the name
    pub stage_templates: Vec<String>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_json: bool,
}

impl Default for DerivekitConfig {
    /// Built-in defaults, ignoring the environment.
    fn default() -> Self {
        Self {
            options_file: PathBuf::from(DEFAULT_OPTIONS_FILE),
            dependency_dir: DEFAULT_DEPENDENCY_DIR.to_string(),
            stage_search_dir: DEFAULT_SEARCH_DIR.to_string(),
            stage_templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}

impl DerivekitConfig {
    /// Loads `DERIVEKIT_*` variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` when a typed variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let options_file = env::var(ENV_OPTIONS_FILE)
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.options_file);

        let dependency_dir = env::var(ENV_DEPENDENCY_DIR).unwrap_or(defaults.dependency_dir);

        let stage_search_dir =
            env::var(ENV_STAGE_SEARCH_DIR).unwrap_or(defaults.stage_search_dir);

        let stage_templates = env::var(ENV_STAGE_TEMPLATES)
            .ok()
            .map(|v| parse_templates(&v))
            .unwrap_or(defaults.stage_templates);

        let log_level = env::var(ENV_LOG_LEVEL)
            .unwrap_or(defaults.log_level)
            .to_lowercase();

        let log_json = match env::var(ENV_LOG_JSON) {
            Ok(v) => v
                .trim()
                .to_lowercase()
                .parse::<bool>()
                .map_err(|e| ConfigError::ParseError {
                    field: ENV_LOG_JSON.to_string(),
                    error: e.to_string(),
                })?,
            Err(_) => defaults.log_json,
        };

        Ok(Self {
            options_file,
            dependency_dir,
            stage_search_dir,
            stage_templates,
            log_level,
            log_json,
        })
    }

    /// Checks that:
    /// - directory names are single path components
    /// - every stage template contains `*`
    /// - log level is valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("dependency_dir", &self.dependency_dir),
            ("stage_search_dir", &self.stage_search_dir),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be a single directory name, got '{}'",
                    field, value
                )));
            }
        }

        if self.stage_templates.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "At least one stage template is required".to_string(),
            ));
        }
        if let Some(template) = self.stage_templates.iter().find(|t| !t.contains('*')) {
            return Err(ConfigError::ValidationFailed(format!(
                "Stage template '{}' has no '*' placeholder",
                template
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn resolver(&self, fs: Arc<dyn FileSystem>) -> StageResolver {
        StageResolver::new(fs)
            .with_search_dir(&self.stage_search_dir)
            .with_templates(self.stage_templates.clone())
    }

    /// A merger using these settings; `resolve_stages` turns on stage resolution.
    pub fn merger(&self, fs: Arc<dyn FileSystem>, resolve_stages: bool) -> PresetMerger {
        let merger = PresetMerger::new(Arc::clone(&fs)).with_dependency_dir(&self.dependency_dir);
        if resolve_stages {
            merger.with_resolver(self.resolver(fs))
        } else {
            merger
        }
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            "options_file".to_string(),
            self.options_file.display().to_string(),
        );
        map.insert("dependency_dir".to_string(), self.dependency_dir.clone());
        map.insert("stage_search_dir".to_string(), self.stage_search_dir.clone());
        map.insert("stage_templates".to_string(), self.stage_templates.join(","));
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("log_json".to_string(), self.log_json.to_string());

        map
    }
}

fn parse_templates(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Display for DerivekitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Derivekit Configuration:")?;
        writeln!(f, "  Options File: {}", self.options_file.display())?;
        writeln!(f, "  Dependency Dir: {}", self.dependency_dir)?;
        writeln!(f, "  Stage Search Dir: {}", self.stage_search_dir)?;
        writeln!(f, "  Stage Templates: {}", self.stage_templates.join(", "))?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  JSON Logs: {}", self.log_json)?;
        Ok(())
    }
}
