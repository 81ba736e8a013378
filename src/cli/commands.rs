use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Config-resolution layer for derivation pipelines
#[derive(Parser, Debug)]
#[command(
    name = "derivekit",
    about = "Compile pattern-keyed stage rules into pipeline options",
    version,
    author,
    long_about = "derivekit merges a project's options file over the built-in preset, \
                  compiles its pattern-keyed rule tables into ordered rule records and \
                  prefetches the files selected by its prefetch declarations."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Merge options over the preset and compile rule tables",
        long_about = "Loads the options file under CONTEXT, merges it over the built-in preset \
                      and prints the compiled options.\n\n\
                      Examples:\n  \
                      derivekit compile\n  \
                      derivekit compile ./app --format json\n  \
                      derivekit compile --config derive.config.yaml --resolve"
    )]
    Compile(CompileArgs),

    #[command(
        about = "Split a glob into its literal scope and local pattern",
        long_about = "Examples:\n  \
                      derivekit split 'src/**/*.css'\n  \
                      derivekit split 'global:lib/*.js'"
    )]
    Split(SplitArgs),

    #[command(
        about = "Run the prefetch declarations of an options file",
        long_about = "Compiles the options under CONTEXT, then lists every file selected by \
                      its prefetch declarations. Unreadable scopes fail the run. A key \
                      without glob syntax names a file rather than a directory to \
                      scan, so it fails the same way.\n\n\
                      Examples:\n  \
                      derivekit prefetch\n  \
                      derivekit prefetch ./app --format yaml"
    )]
    Prefetch(PrefetchArgs),

    #[command(
        about = "Show the effective settings",
        long_about = "Prints the settings read from DERIVEKIT_* environment variables, \
                      after defaults are applied.\n\n\
                      Examples:\n  \
                      derivekit config\n  \
                      DERIVEKIT_OPTIONS_FILE=derive.yaml derivekit config --format json"
    )]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    #[arg(
        value_name = "CONTEXT",
        help = "Project directory (defaults to current directory)"
    )]
    pub context: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Options file, relative to CONTEXT (defaults to derive.config.json)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Resolve stage names to module paths")]
    pub resolve: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SplitArgs {
    #[arg(value_name = "PATTERN", help = "Glob pattern, optionally prefixed with 'global:'")]
    pub pattern: String,

    #[arg(long, help = "Treat the pattern as global")]
    pub global: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PrefetchArgs {
    #[arg(
        value_name = "CONTEXT",
        help = "Project directory (defaults to current directory)"
    )]
    pub context: Option<PathBuf>,

    #[arg(short = 'c', long, value_name = "FILE", help = "Options file, relative to CONTEXT")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
