//! derivekit - config resolution for derivation pipelines
//!
//! A build pipeline applies ordered chains of transformation stages to the
//! files of a project. derivekit turns a project's declarative options into
//! what that pipeline consumes:
//!
//! - **Rule tables** map glob patterns (optionally `global:`) to stage
//!   shorthand; [`RuleSetCompiler`] turns them into ordered [`RuleRecord`]s.
//! - **Stage chains** serialize to deterministic request strings
//!   (`style!css?modules`) used as cache keys.
//! - **Presets** supply default rules; [`PresetMerger`] lays the user's
//!   options over them key by key.
//! - **Prefetch** declarations are split into a literal scope and a
//!   predicate, and registered with a [`DiscoveryHost`] before the module
//!   graph is walked.
//!
//! # Example
//!
//! ```no_run
//! use derivekit::fs::RealFileSystem;
//! use derivekit::PresetMerger;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let merger = PresetMerger::new(Arc::new(RealFileSystem::new()));
//! let options = merger.merge(Path::new("/srv/app"), None)?;
//! for rule in &options.module.loaders {
//!     println!("{} -> {}", rule.predicate, rule.request());
//! }
//! # Ok::<(), derivekit::ConfigError>(())
//! ```

pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod glob;
pub mod prefetch;
pub mod preset;
pub mod resolve;
pub mod rules;
pub mod util;

pub use chain::{serialize, ChainNode, StageChain, StageReference};
pub use config::DerivekitConfig;
pub use error::{ConfigError, DiscoveryError, ResolutionError};
pub use glob::{split, ScopePredicate, ScopeSplit};
pub use prefetch::{
    register_all, register_discovery, BuildDiagnostics, ContextPrefetch, DiscoveryHost,
    DiscoveryRequest, FsDiscoveryHost,
};
pub use preset::{CompiledOptions, Preset, PresetMerger, UserOptions};
pub use resolve::StageResolver;
pub use rules::{compile_rules, RuleRecord, RuleSetCompiler, RuleTable, StageShorthand};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
