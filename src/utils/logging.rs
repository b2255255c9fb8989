use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::error::{ProcessingError, Result};

/// Log level for this crate when `RUST_LOG` does not say otherwise
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "eto_processor=warn"
    } else if verbose {
        "eto_processor=debug"
    } else {
        "eto_processor=info"
    }
}

/// `RUST_LOG` wins when it is set and parses; otherwise the flag level applies
pub fn env_filter(rust_log: Option<&str>, verbose: bool, quiet: bool) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose, quiet)))
}

/// Install the global subscriber. Events go to stderr, or are appended to
/// `log_file` without colour codes when one is given.
pub fn init_tracing(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(rust_log.as_deref(), verbose, quiet);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| ProcessingError::Config(format!("logging already initialised: {}", e)))
}
