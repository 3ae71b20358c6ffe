//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Harvest dataset metadata from the catalog and store reconciled records.
///
/// Each identifier in IDS_FILE is fetched as ISO-19115 XML, catalog JSON,
/// Schema.org JSON-LD and RDF/Turtle; whichever formats respond are merged
/// into one record and written to the SQLite database.
///
/// Exit codes: 0 all succeeded, 2 some failed, 1 all failed or fatal error.
#[derive(Parser, Debug)]
#[command(name = "catalog-ingest")]
#[command(author, version, about)]
pub struct Args {
    /// File with one dataset identifier per line (`#` starts a comment)
    pub ids_file: PathBuf,

    /// SQLite database file [default: catalog.db]
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/catalog-ingest/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Catalog root URL [default: https://catalogue.ceh.ac.uk]
    #[arg(long)]
    pub base_url: Option<String>,

    /// Attempts per document, first try included (1-10) [default: 3]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: Option<u32>,

    /// Pause between attempts in milliseconds (0-60000) [default: 500]
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub retry_delay: Option<u64>,

    /// Identifiers between progress logs and pauses, 0 to disable [default: 10]
    #[arg(long)]
    pub progress_interval: Option<usize>,

    /// Pause after each progress log in milliseconds (0-60000) [default: 500]
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pause: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
