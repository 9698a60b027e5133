//! tarsort - compression-friendly file ordering for tar
//!
//! Walks a set of paths, fingerprints every regular file with BLAKE3, and
//! emits the files ordered by extension, then name, then directory, keeping
//! files with identical content next to each other. The result is either a
//! path list for an external `tar`, or an archive written directly, where
//! identical files can be stored as hardlinks.

pub mod cli;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod tree;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;

use crate::cli::Cli;
use crate::config::{Config, Mode, RunOptions};
use crate::error::ExitCode;
use crate::output::{ArchiveSink, ListSink, Separator, Sink};
use crate::scanner::Hasher;
use crate::tree::{RunSummary, Tree, TreeError};

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the run fails.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.debug, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::Success);
    }

    // Flag combinations are checked before the output file is created.
    let options = RunOptions::from_cli(&cli, &config)?;
    log::debug!("Run options: {options:?}");

    run(&options)?;
    Ok(ExitCode::Success)
}

/// Scan every root in `options.paths`, then emit the ordered result.
///
/// # Errors
///
/// Returns an error if the output cannot be opened, a root cannot be
/// scanned, or an entry cannot be written.
pub fn run(options: &RunOptions) -> anyhow::Result<RunSummary> {
    let writer: Box<dyn Write> = match &options.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let writer = BufWriter::with_capacity(options.write_buffer_size, writer);
    let hasher = Hasher::new().with_chunk_size(options.read_buffer_size);

    let summary = match options.mode {
        Mode::List => drive(ListSink::new(writer, Separator::Newline), hasher, options)?,
        Mode::ListNul => drive(ListSink::new(writer, Separator::Nul), hasher, options)?,
        Mode::Archive | Mode::ArchiveLinks => {
            let sink = ArchiveSink::new(writer, options.mode == Mode::ArchiveLinks);
            let sink = if options.verbose { sink.verbose() } else { sink };
            drive(sink, hasher, options)?
        }
    };
    Ok(summary)
}

fn drive<S: Sink>(sink: S, hasher: Hasher, options: &RunOptions) -> Result<RunSummary, TreeError> {
    let mut tree = Tree::new(sink, hasher);
    for root in &options.paths {
        tree.scan(root)?;
    }
    tree.process()?;
    tree.finish()
}
