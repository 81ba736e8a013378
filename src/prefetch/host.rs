use super::binding::DiscoveryRequest;
use crate::chain::STAGE_SEPARATOR;
use crate::error::DiscoveryError;
use crate::fs::FileSystem;
use crate::glob::RELATIVE_MARKER;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{trace, warn};

/// A file selected by a discovery request, with the request it needs.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Path as offered to the predicate, `./`-prefixed.
    pub relative: String,
    pub request: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryOutcome {
    pub scope: PathBuf,
    pub files: Vec<DiscoveredFile>,
}

/// The pipeline's dependency-discovery mechanism. Each call answers exactly
/// one request.
#[async_trait]
pub trait DiscoveryHost: Send + Sync {
    async fn prefetch(&self, request: &DiscoveryRequest) -> Result<DiscoveryOutcome, DiscoveryError>;
}

/// Discovery over a [`FileSystem`]: lists the scope and keeps the files the
/// predicate accepts.
pub struct FsDiscoveryHost {
    fs: Arc<dyn FileSystem>,
}

impl FsDiscoveryHost {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl DiscoveryHost for FsDiscoveryHost {
    async fn prefetch(&self, request: &DiscoveryRequest) -> Result<DiscoveryOutcome, DiscoveryError> {
        let fs = Arc::clone(&self.fs);
        let request = request.clone();
        let scope = request.scope_directory.clone();

        tokio::task::spawn_blocking(move || discover(fs.as_ref(), &request))
            .await
            .map_err(|_| DiscoveryError::Dropped { scope })?
    }
}

fn discover(fs: &dyn FileSystem, request: &DiscoveryRequest) -> Result<DiscoveryOutcome, DiscoveryError> {
    let scope = &request.scope_directory;
    if fs.is_file(scope) {
        warn!(
            "Prefetch scope {} is a file; a fully literal pattern leaves no directory to scan",
            scope.display()
        );
        return Err(DiscoveryError::ScopeUnreadable {
            scope: scope.clone(),
            reason: "is a file, not a directory".to_string(),
        });
    }

    let files = fs
        .walk_files(scope)
        .map_err(|e| DiscoveryError::ScopeUnreadable {
            scope: scope.clone(),
            reason: format!("{:#}", e),
        })?;

    let mut discovered = Vec::new();
    for path in files {
        let Some(relative) = relative_path(scope, &path) else {
            continue;
        };
        if !request.recursive && relative.contains('/') {
            continue;
        }

        let relative = format!("{}{}", RELATIVE_MARKER, relative);
        let accepted = request.predicate.is_match(&relative);
        trace!("{} -> {}", relative, accepted);
        if accepted {
            discovered.push(DiscoveredFile {
                request: format!(
                    "{sep}{sep}{}{sep}{}",
                    request.chain_request,
                    path.display(),
                    sep = STAGE_SEPARATOR
                ),
                path,
                relative,
            });
        }
    }

    Ok(DiscoveryOutcome {
        scope: scope.clone(),
        files: discovered,
    })
}

/// `path` below `scope`, with `/` separators.
fn relative_path(scope: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(scope).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
