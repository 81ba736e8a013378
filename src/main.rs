use derivekit::cli::commands::{CliArgs, Commands};
use derivekit::cli::handlers::{handle_compile, handle_config, handle_prefetch, handle_split};
use derivekit::util::logging::{init_logging, parse_level, LoggingConfig};
use derivekit::{DerivekitConfig, VERSION};

use clap::Parser;
use tracing::{debug, error, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match DerivekitConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    init_logging_from_args(&args, &config);

    debug!("derivekit v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    let exit_code = match &args.command {
        Commands::Compile(compile_args) => handle_compile(compile_args, &config),
        Commands::Split(split_args) => handle_split(split_args),
        Commands::Prefetch(prefetch_args) => handle_prefetch(prefetch_args, &config).await,
        Commands::Config(config_args) => handle_config(config_args, &config),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &DerivekitConfig) {
    let mut logging = LoggingConfig::from_config(config);
    logging.level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        logging.level
    };
    init_logging(logging);
}
