//! Command-line front end: argument parsing, configuration, logging and
//! exit codes around [`engine::scan`].

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod config;
pub mod run;
mod ui;

/// Installs the stderr log subscriber. `RUST_LOG` refines the level chosen
/// by `--debug`/`--quiet`.
pub fn init_logging(debug: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::OFF
    } else if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
