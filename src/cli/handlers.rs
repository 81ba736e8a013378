//! Command handlers. Each returns the process exit code.

use super::commands::{CompileArgs, ConfigArgs, PrefetchArgs, SplitArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::DerivekitConfig;
use crate::fs::{FileSystem, RealFileSystem};
use crate::glob::split;
use crate::prefetch::{register_all, FsDiscoveryHost};
use crate::preset::CompiledOptions;
use crate::rules::PatternKey;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

pub fn handle_compile(args: &CompileArgs, config: &DerivekitConfig) -> i32 {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());

    let result = compile(
        Arc::clone(&fs),
        config,
        args.context.as_deref(),
        args.config.as_deref(),
        args.resolve,
    )
    .and_then(|compiled| OutputFormatter::new(args.format.into()).format_compiled(&compiled));

    emit(result)
}

pub fn handle_split(args: &SplitArgs) -> i32 {
    let key = PatternKey::parse(&args.pattern);
    let global = key.global || args.global;

    let result = split(&key.pattern, global)
        .map_err(anyhow::Error::from)
        .and_then(|split| OutputFormatter::new(args.format.into()).format_split(&split));

    emit(result)
}

pub async fn handle_prefetch(args: &PrefetchArgs, config: &DerivekitConfig) -> i32 {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());

    let compiled = match compile(
        Arc::clone(&fs),
        config,
        args.context.as_deref(),
        args.config.as_deref(),
        false,
    ) {
        Ok(compiled) => compiled,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    if compiled.prefetch.is_empty() {
        info!("No prefetch declarations under {}", compiled.context.display());
    }

    let host = FsDiscoveryHost::new(fs);
    let diagnostics = register_all(&host, &compiled.prefetch).await;
    let format: OutputFormat = args.format.into();

    match OutputFormatter::new(format).format_prefetch(&diagnostics) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    }

    if diagnostics.has_errors() {
        1
    } else {
        0
    }
}

pub fn handle_config(args: &ConfigArgs, config: &DerivekitConfig) -> i32 {
    emit(OutputFormatter::new(args.format.into()).format_config(config))
}

fn compile(
    fs: Arc<dyn FileSystem>,
    config: &DerivekitConfig,
    context: Option<&Path>,
    options_file: Option<&Path>,
    resolve_stages: bool,
) -> Result<CompiledOptions> {
    let context = resolve_context(fs.as_ref(), context)?;
    let options_file = options_file.unwrap_or(&config.options_file);
    debug!(
        "Compiling {} under {}",
        options_file.display(),
        context.display()
    );

    let merger = config.merger(fs, resolve_stages);
    let compiled = merger
        .merge(&context, Some(options_file))
        .with_context(|| format!("Failed to compile options for {}", context.display()))?;
    Ok(compiled)
}

fn resolve_context(fs: &dyn FileSystem, context: Option<&Path>) -> Result<PathBuf> {
    let context = match context {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    if !fs.is_dir(&context) {
        anyhow::bail!("Context is not a directory: {}", context.display());
    }
    fs.canonicalize(&context)
}

fn emit(result: Result<String>) -> i32 {
    match result {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}
