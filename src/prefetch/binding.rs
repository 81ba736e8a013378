use super::host::{DiscoveryHost, DiscoveryOutcome};
use crate::chain::{context_request, StageChain, StageReference};
use crate::error::{ConfigError, DiscoveryError};
use crate::glob::{split, ScopePredicate};
use crate::rules::{PatternKey, StageShorthand};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// No-op stage that terminates every prefetch chain.
pub const NULL_STAGE: &str = "builtin:null";

/// A scope to resolve eagerly, before the module graph is walked.
#[derive(Debug, Clone)]
pub struct ContextPrefetch {
    pub scope: PathBuf,
    pub predicate: ScopePredicate,
    pub stage_chain: StageChain,
}

impl ContextPrefetch {
    pub fn new(scope: impl Into<PathBuf>, predicate: ScopePredicate, stage_chain: StageChain) -> Self {
        Self {
            scope: scope.into(),
            predicate,
            stage_chain,
        }
    }

    /// Prefetch for every file matched by `key` (optionally `global:`)
    /// under `context`, scoped to the pattern's literal prefix.
    pub fn from_pattern(
        context: &Path,
        key: &str,
        stage_chain: StageChain,
    ) -> Result<Self, ConfigError> {
        let PatternKey { pattern, global } = PatternKey::parse(key);
        let split = split(&pattern, global)?;
        Ok(Self::new(split.scope_dir(context), split.predicate, stage_chain))
    }

    /// One prefetch per chain described by `shorthand`.
    pub fn from_shorthand(
        context: &Path,
        key: &str,
        shorthand: &StageShorthand,
    ) -> Result<Vec<Self>, ConfigError> {
        let pattern = PatternKey::parse(key).pattern;
        shorthand
            .chains(&pattern)?
            .into_iter()
            .map(|chain| Self::from_pattern(context, key, chain))
            .collect()
    }

    /// The configured chain with the null stage in front.
    pub fn terminal_chain(&self) -> StageChain {
        self.stage_chain.prepend(StageReference::new(NULL_STAGE))
    }

    pub fn discovery_request(&self) -> DiscoveryRequest {
        DiscoveryRequest {
            scope_directory: self.scope.clone(),
            recursive: true,
            predicate: self.predicate.clone(),
            chain_request: self.terminal_chain().request(),
        }
    }
}

impl Serialize for ContextPrefetch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ContextPrefetch", 5)?;
        state.serialize_field("scope", &self.scope)?;
        state.serialize_field("test", self.predicate.pattern())?;
        state.serialize_field("global", &self.predicate.is_global())?;
        state.serialize_field("stages", &self.stage_chain)?;
        state.serialize_field("request", &self.discovery_request().request())?;
        state.end()
    }
}

/// What the host pipeline is asked to resolve.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub scope_directory: PathBuf,
    pub recursive: bool,
    pub predicate: ScopePredicate,
    /// Serialized chain, null stage included.
    pub chain_request: String,
}

impl DiscoveryRequest {
    /// `!!<chain>!<scope>`, the request for the whole scope directory.
    pub fn request(&self) -> String {
        context_request(&self.chain_request, &self.scope_directory)
    }
}

/// Issues the discovery request for one prefetch and waits for its result.
pub async fn register_discovery(
    host: &dyn DiscoveryHost,
    prefetch: &ContextPrefetch,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    let request = prefetch.discovery_request();
    debug!(
        scope = %request.scope_directory.display(),
        predicate = %request.predicate,
        "Registering discovery request {}",
        request.request()
    );

    let outcome = host.prefetch(&request).await?;
    debug!(
        "Discovered {} file(s) under {}",
        outcome.files.len(),
        outcome.scope.display()
    );
    Ok(outcome)
}

/// Results of prefetching a set of scopes. Failures are build errors but do
/// not stop the remaining requests.
#[derive(Debug, Default)]
pub struct BuildDiagnostics {
    pub outcomes: Vec<DiscoveryOutcome>,
    pub errors: Vec<DiscoveryError>,
}

impl BuildDiagnostics {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn discovered_files(&self) -> usize {
        self.outcomes.iter().map(|o| o.files.len()).sum()
    }
}

/// Registers every prefetch in order.
pub async fn register_all(host: &dyn DiscoveryHost, prefetches: &[ContextPrefetch]) -> BuildDiagnostics {
    let mut diagnostics = BuildDiagnostics::default();

    for prefetch in prefetches {
        match register_discovery(host, prefetch).await {
            Ok(outcome) => diagnostics.outcomes.push(outcome),
            Err(e) => {
                error!("{}", e);
                diagnostics.errors.push(e);
            }
        }
    }

    info!(
        "Prefetched {} scope(s), {} file(s), {} error(s)",
        diagnostics.outcomes.len(),
        diagnostics.discovered_files(),
        diagnostics.errors.len()
    );
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefetch::host::DiscoveredFile;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requests and fails any scope whose path contains "broken".
    #[derive(Default)]
    struct RecordingHost {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DiscoveryHost for RecordingHost {
        async fn prefetch(
            &self,
            request: &DiscoveryRequest,
        ) -> Result<DiscoveryOutcome, DiscoveryError> {
            self.seen.lock().unwrap().push(request.request());
            if request.scope_directory.to_string_lossy().contains("broken") {
                return Err(DiscoveryError::ScopeUnreadable {
                    scope: request.scope_directory.clone(),
                    reason: "denied".to_string(),
                });
            }
            Ok(DiscoveryOutcome {
                scope: request.scope_directory.clone(),
                files: vec![DiscoveredFile {
                    path: request.scope_directory.join("a.js"),
                    relative: "./a.js".to_string(),
                    request: String::new(),
                }],
            })
        }
    }

    fn eslint() -> StageChain {
        StageChain::new(vec![StageReference::new("eslint")])
    }

    #[test]
    fn test_from_pattern_scopes_under_context() {
        let prefetch = ContextPrefetch::from_pattern(Path::new("/proj"), "src/**/*.js", eslint()).unwrap();
        assert_eq!(prefetch.scope, PathBuf::from("/proj/src"));
        assert!(!prefetch.predicate.is_global());
        assert!(prefetch.predicate.is_match("./app/main.js"));
    }

    #[test]
    fn test_from_pattern_global_marker() {
        let prefetch = ContextPrefetch::from_pattern(Path::new("/proj"), "global:**/*.js", eslint()).unwrap();
        assert_eq!(prefetch.scope, PathBuf::from("/proj"));
        assert!(prefetch.predicate.is_global());
    }

    #[test]
    fn test_discovery_request_shape() {
        let prefetch = ContextPrefetch::from_pattern(Path::new("/proj"), "src/*.js", eslint()).unwrap();
        let request = prefetch.discovery_request();
        assert!(request.recursive);
        assert_eq!(request.chain_request, "builtin:null!eslint");
        assert_eq!(request.request(), "!!builtin:null!eslint!/proj/src");
    }

    #[test]
    fn test_from_shorthand_expands_groups() {
        let shorthand = StageShorthand::List(vec![
            StageShorthand::list(["eslint"]),
            StageShorthand::list(["stylelint"]),
        ]);
        let prefetches = ContextPrefetch::from_shorthand(Path::new("/p"), "src/**", &shorthand).unwrap();
        assert_eq!(prefetches.len(), 2);
        assert_eq!(prefetches[1].stage_chain.request(), "stylelint");
    }

    #[test]
    fn test_serialized_shape() {
        let prefetch = ContextPrefetch::from_pattern(Path::new("/proj"), "src/*.js", eslint()).unwrap();
        let value = serde_json::to_value(&prefetch).unwrap();
        assert_eq!(value["scope"], "/proj/src");
        assert_eq!(value["test"], "src/*.js");
        assert_eq!(value["global"], false);
        assert_eq!(value["request"], "!!builtin:null!eslint!/proj/src");
    }

    #[tokio::test]
    async fn test_register_all_continues_after_failure() {
        let host = RecordingHost::default();
        let prefetches = vec![
            ContextPrefetch::from_pattern(Path::new("/proj"), "broken/*.js", eslint()).unwrap(),
            ContextPrefetch::from_pattern(Path::new("/proj"), "src/*.js", eslint()).unwrap(),
        ];

        let diagnostics = register_all(&host, &prefetches).await;

        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.errors.len(), 1);
        assert_eq!(diagnostics.outcomes.len(), 1);
        assert_eq!(diagnostics.discovered_files(), 1);
        assert_eq!(host.seen.lock().unwrap().len(), 2);
    }
}
