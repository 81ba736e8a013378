pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    CliArgs, Commands, CompileArgs, ConfigArgs, OutputFormatArg, PrefetchArgs, SplitArgs,
};
pub use output::{OutputFormat, OutputFormatter};
