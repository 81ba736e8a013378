use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems, raised before any build work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid stage definition for '{pattern}': {reason}")]
    InvalidStage { pattern: String, reason: String },

    #[error("Failed to load options from {path}: {reason}")]
    InvalidOptions { path: PathBuf, reason: String },

    #[error("Unsupported options file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl ConfigError {
    pub fn invalid_pattern(pattern: impl Into<String>, err: impl ToString) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }
}

/// A stage name that could not be located under its base directory.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Cannot resolve stage '{stage}' from {base_dir}")]
    NotFound { stage: String, base_dir: PathBuf },

    #[error("Invalid package manifest for stage '{stage}' at {manifest}: {reason}")]
    InvalidManifest {
        stage: String,
        manifest: PathBuf,
        reason: String,
    },
}

impl ResolutionError {
    pub fn stage(&self) -> &str {
        match self {
            ResolutionError::NotFound { stage, .. } => stage,
            ResolutionError::InvalidManifest { stage, .. } => stage,
        }
    }
}

/// Failures reported to the build error channel during context prefetch.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Cannot read scope directory {scope}: {reason}")]
    ScopeUnreadable { scope: PathBuf, reason: String },

    #[error("Discovery request for {scope} was dropped by the host")]
    Dropped { scope: PathBuf },

    #[error("Discovery failed for {scope}: {reason}")]
    Host { scope: PathBuf, reason: String },
}

impl DiscoveryError {
    pub fn scope(&self) -> &PathBuf {
        match self {
            DiscoveryError::ScopeUnreadable { scope, .. }
            | DiscoveryError::Dropped { scope }
            | DiscoveryError::Host { scope, .. } => scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_names_pattern() {
        let err = ConfigError::invalid_pattern("src/[a", "unclosed character class");
        let msg = err.to_string();
        assert!(msg.contains("src/[a"));
        assert!(msg.contains("unclosed"));
    }

    #[test]
    fn test_resolution_error_reports_stage_and_base() {
        let err = ResolutionError::NotFound {
            stage: "babel".to_string(),
            base_dir: PathBuf::from("/proj"),
        };
        assert_eq!(err.stage(), "babel");
        assert_eq!(err.to_string(), "Cannot resolve stage 'babel' from /proj");
    }

    #[test]
    fn test_resolution_converts_into_config_error() {
        let err: ConfigError = ResolutionError::NotFound {
            stage: "css".to_string(),
            base_dir: PathBuf::from("/proj"),
        }
        .into();
        assert!(matches!(err, ConfigError::Resolution(_)));
        assert!(err.to_string().contains("'css'"));
    }

    #[test]
    fn test_discovery_error_scope() {
        let err = DiscoveryError::ScopeUnreadable {
            scope: PathBuf::from("/proj/src"),
            reason: "permission denied".to_string(),
        };
        assert_eq!(err.scope(), &PathBuf::from("/proj/src"));
    }
}
