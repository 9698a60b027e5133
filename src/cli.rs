//! Command-line interface definitions for tarsort.
//!
//! The flags mirror the classic `find | tar` workflow: by default the sorted
//! file list is printed, `-c` writes an archive instead.
//!
//! # Example
//!
//! ```bash
//! # Print paths in compression-friendly order
//! tarsort src docs
//!
//! # Feed GNU tar with NUL-separated names
//! tarsort -0 data | tar --null --no-recursion -T - -cf data.tar
//!
//! # Write the archive directly, hardlinking identical files
//! tarsort -c -l -o backup.tar ~/projects | xz > backup.tar.xz
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Sort files to improve tar compression.
///
/// Files are ordered by extension, then name, then directory, and files with
/// identical content are always kept next to each other.
#[derive(Debug, Parser)]
#[command(name = "tarsort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Terminate printed paths with NUL instead of newline (like -print0)
    #[arg(short = '0', long = "null")]
    pub null: bool,

    /// Write a tar archive instead of printing file names
    #[arg(short = 'c', long)]
    pub create: bool,

    /// Store identical files as hardlinks (requires -c)
    #[arg(short = 'l', long)]
    pub links: bool,

    /// Output file (default: standard output)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// List archived entries on standard error (with -c)
    #[arg(short, long)]
    pub verbose: bool,

    /// Increase log level (-d for info, -dd for debug, -ddd for trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Suppress all log output except errors
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Read settings from this TOML file
    #[arg(long, value_name = "FILE", env = "TARSORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Report errors as JSON on standard error
    #[arg(long)]
    pub json_errors: bool,

    /// Files and directories to scan
    #[arg(value_name = "PATH", required_unless_present = "dump_config")]
    pub paths: Vec<PathBuf>,
}
