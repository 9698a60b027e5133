//! Logging infrastructure for tarsort.
//!
//! This module provides structured logging using the `log` facade and `env_logger` backend.
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--debug` (info/debug/trace)
//! 3. Default: warn level
//!
//! Logs always go to standard error so they never mix with the path list
//! or archive written to standard output.
//!
//! # Example
//!
//! ```rust,no_run
//! use tarsort::logging::init_logging;
//!
//! // Initialize with debug mode (-dd)
//! init_logging(2, false);
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem based on CLI flags.
///
/// # Priority
///
/// 1. If `RUST_LOG` environment variable is set, it takes precedence
/// 2. If `quiet` is true: Error level only
/// 3. If `debug >= 3`: Trace level
/// 4. If `debug == 2`: Debug level
/// 5. If `debug == 1`: Info level
/// 6. Default: Warn level
///
/// Calling this more than once leaves the first logger in place.
pub fn init_logging(debug: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(debug, quiet));
    }

    configure_format(&mut builder, debug);

    if builder.try_init().is_err() {
        return;
    }

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(debug, quiet)
        );
    }
}

/// Determine the log level from CLI flags.
fn determine_level(debug: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match debug {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Configure the log format.
///
/// Debug and trace output carry a timestamp and module path; otherwise
/// only the level and message are printed.
fn configure_format(builder: &mut Builder, debug: u8) {
    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);

        if debug >= 2 {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                buf.timestamp_millis(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "tarsort: {level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        }
    });
}
