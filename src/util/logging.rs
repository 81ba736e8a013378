//! Structured logging setup for derivekit
//!
//! Console output by default, JSON when asked for. `RUST_LOG` directives are
//! honored on top of the configured level. The subscriber is installed at
//! most once per process.
//!
//! ```no_run
//! use derivekit::util::logging::{init_logging, LoggingConfig};
//! use derivekit::DerivekitConfig;
//!
//! let config = DerivekitConfig::default();
//! init_logging(LoggingConfig::from_config(&config));
//! tracing::info!("Compiling options");
//! ```

use crate::config::DerivekitConfig;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for `derivekit` targets
    pub level: Level,

    pub use_json: bool,

    /// Include the module target (e.g., derivekit::rules) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Level and format taken from runtime settings.
    pub fn from_config(config: &DerivekitConfig) -> Self {
        Self {
            level: parse_level(&config.log_level),
            use_json: config.log_json,
            ..Default::default()
        }
    }
}

/// Parses a log level, case-insensitively. Unknown values fall back to INFO.
///
/// ```
/// use derivekit::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("Debug"), Level::DEBUG);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("derivekit={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}
