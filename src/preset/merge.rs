use super::options::{
    load_options, EntryOption, OutputOption, UserOptions, DEFAULT_OPTIONS_FILE,
};
use crate::error::ConfigError;
use crate::fs::FileSystem;
use crate::prefetch::ContextPrefetch;
use crate::resolve::StageResolver;
use crate::rules::{
    RuleRecord, RuleSetCompiler, RuleTable, StageObject, StageShorthand, DEFAULT_DEPENDENCY_DIR,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_DEVTOOL: &str = "cheap-module-eval-source-map";

/// Defaults applied under every user options file.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub loaders: RuleTable,
    pub pre_loaders: RuleTable,
    pub devtool: Option<String>,
}

impl Preset {
    /// The built-in table: scripts, styles, json and static assets.
    pub fn builtin() -> Self {
        let mut loaders = RuleTable::new();
        loaders.insert("**/*.js".to_string(), StageShorthand::name("babel"));
        loaders.insert("**/*.css".to_string(), StageShorthand::list(["style", "css"]));
        loaders.insert(
            "**/*.less".to_string(),
            StageShorthand::list(["style", "css", "less"]),
        );
        loaders.insert("**/*.json".to_string(), StageShorthand::name("json"));
        loaders.insert(
            "**/*.{png,jpg,jpeg,gif,svg}".to_string(),
            StageShorthand::Stage(StageObject {
                name: "url".to_string(),
                parameters: Some(json!({ "limit": 10000 })),
            }),
        );
        loaders.insert(
            "global:**/*.{woff,woff2,ttf,eot}".to_string(),
            StageShorthand::name("file"),
        );

        Self {
            loaders,
            pre_loaders: RuleTable::new(),
            devtool: Some(DEFAULT_DEVTOOL.to_string()),
        }
    }

    /// No default rules and no devtool.
    pub fn empty() -> Self {
        Self {
            loaders: RuleTable::new(),
            pre_loaders: RuleTable::new(),
            devtool: None,
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Key-level merge: a user key replaces the default with the same text and
/// keeps the default's position; new user keys follow in their own order.
pub fn merge_rule_tables(defaults: &RuleTable, user: Option<&RuleTable>) -> RuleTable {
    let mut merged = defaults.clone();
    if let Some(user) = user {
        for (key, shorthand) in user {
            if merged.insert(key.clone(), shorthand.clone()).is_some() {
                debug!("User rule '{}' replaces the preset entry", key);
            }
        }
    }
    merged
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledModule {
    pub loaders: Vec<RuleRecord>,
    #[serde(rename = "preLoaders")]
    pub pre_loaders: Vec<RuleRecord>,
}

/// Entry points, every value normalized to a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    List(Vec<String>),
    Named(IndexMap<String, Vec<String>>),
}

impl Entry {
    fn normalize(entry: Option<EntryOption>) -> Self {
        match entry {
            None => Entry::List(Vec::new()),
            Some(EntryOption::Points(points)) => Entry::List(points.into_vec()),
            Some(EntryOption::Named(named)) => Entry::Named(
                named
                    .into_iter()
                    .map(|(name, points)| (name, points.into_vec()))
                    .collect(),
            ),
        }
    }
}

/// Output settings with an absolute `path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputOptions {
    pub path: PathBuf,
    #[serde(flatten)]
    pub rest: IndexMap<String, Value>,
}

impl OutputOptions {
    fn normalize(output: Option<OutputOption>, context: &Path) -> Self {
        let (path, rest) = match output {
            None => (None, IndexMap::new()),
            Some(OutputOption::Path(path)) => (Some(PathBuf::from(path)), IndexMap::new()),
            Some(OutputOption::Object(object)) => (object.path, object.rest),
        };

        let path = match path {
            Some(path) if path.is_absolute() => path,
            Some(path) => context.join(path),
            None => context.to_path_buf(),
        };
        Self { path, rest }
    }
}

/// Final options for one build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledOptions {
    pub context: PathBuf,
    pub module: CompiledModule,
    pub entry: Entry,
    pub output: OutputOptions,
    pub plugins: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devtool: Option<String>,
    pub prefetch: Vec<ContextPrefetch>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Loads user options and merges them over a [`Preset`].
pub struct PresetMerger {
    fs: Arc<dyn FileSystem>,
    preset: Preset,
    dependency_dir: String,
    resolver: Option<StageResolver>,
}

impl PresetMerger {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            preset: Preset::builtin(),
            dependency_dir: DEFAULT_DEPENDENCY_DIR.to_string(),
            resolver: None,
        }
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_dependency_dir(mut self, name: impl Into<String>) -> Self {
        self.dependency_dir = name.into();
        self
    }

    /// Resolve stage names to module paths while compiling.
    pub fn with_resolver(mut self, resolver: StageResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    /// Reads `options_ref` (default file name when `None`) under `context`
    /// and compiles the merged result. A missing file means defaults only.
    pub fn merge(
        &self,
        context: &Path,
        options_ref: Option<&Path>,
    ) -> Result<CompiledOptions, ConfigError> {
        let reference = options_ref.unwrap_or_else(|| Path::new(DEFAULT_OPTIONS_FILE));
        let options = load_options(self.fs.as_ref(), context, reference)?.unwrap_or_default();
        self.compile(context, options)
    }

    /// Merges already-parsed `options` over the preset.
    pub fn compile(
        &self,
        context: &Path,
        options: UserOptions,
    ) -> Result<CompiledOptions, ConfigError> {
        let context = match &options.context {
            Some(user_context) => context.join(user_context),
            None => context.to_path_buf(),
        };

        let module = options.module.unwrap_or_default();
        let loaders = merge_rule_tables(&self.preset.loaders, module.loaders.as_ref());
        let pre_loaders = merge_rule_tables(&self.preset.pre_loaders, module.pre_loaders.as_ref());

        let mut compiler = RuleSetCompiler::new(&context).dependency_dir(&self.dependency_dir);
        if let Some(resolver) = &self.resolver {
            compiler = compiler.with_resolver(resolver);
        }

        let module = CompiledModule {
            loaders: compiler.compile(&loaders)?,
            pre_loaders: compiler.compile(&pre_loaders)?,
        };

        let prefetch = match &options.prefetch {
            Some(table) => self.compile_prefetch(&context, table)?,
            None => Vec::new(),
        };

        let compiled = CompiledOptions {
            entry: Entry::normalize(options.entry),
            output: OutputOptions::normalize(options.output, &context),
            plugins: options.plugins.unwrap_or_default(),
            devtool: options.devtool.or_else(|| self.preset.devtool.clone()),
            module,
            prefetch,
            extra: options.extra,
            context,
        };

        info!(
            "Compiled options for {}: {} loader(s), {} pre-loader(s), {} prefetch scope(s)",
            compiled.context.display(),
            compiled.module.loaders.len(),
            compiled.module.pre_loaders.len(),
            compiled.prefetch.len()
        );
        Ok(compiled)
    }

    fn compile_prefetch(
        &self,
        context: &Path,
        table: &RuleTable,
    ) -> Result<Vec<ContextPrefetch>, ConfigError> {
        let mut prefetches = Vec::new();
        for (key, shorthand) in table {
            for mut prefetch in ContextPrefetch::from_shorthand(context, key, shorthand)? {
                if let Some(resolver) = &self.resolver {
                    prefetch.stage_chain = resolver.resolve_chain(&prefetch.stage_chain, context)?;
                }
                prefetches.push(prefetch);
            }
        }
        Ok(prefetches)
    }
}
