//! CLI entry point for catalog-ingest.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog_ingest_core::{
    Database, DatasetRepository, DatasetStore, Pipeline, read_identifiers_file, run_batch,
};
use clap::Parser;
use tracing::{debug, info, warn};

mod cli;
mod config;
mod terminal;

use cli::Args;
use terminal::BatchProgress;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    // Parse before tracing so --help prints without log noise
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return Ok(i32::from(err.use_stderr()));
        }
    };

    terminal::init_tracing(terminal::default_log_level(args.quiet, args.verbose));
    debug!(?args, "CLI arguments parsed");

    let loaded = config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "config file loaded");
    }
    let settings = config::resolve_settings(&args, loaded.config.as_ref())?;
    debug!(?settings, "run settings resolved");

    let identifiers = read_identifiers_file(&args.ids_file).with_context(|| {
        format!(
            "Failed to read identifier file '{}'",
            args.ids_file.display()
        )
    })?;
    if identifiers.is_empty() {
        warn!(path = %args.ids_file.display(), "identifier file lists no identifiers");
    }

    let db = Database::with_options(&settings.database, settings.database_options)
        .await
        .with_context(|| {
            format!(
                "Failed to open database '{}'",
                settings.database.display()
            )
        })?;
    let repository = Arc::new(DatasetRepository::new(db.clone()));
    let store: Arc<dyn DatasetStore> = repository.clone();
    let pipeline =
        Pipeline::new(&settings.pipeline, store).context("Failed to build HTTP client")?;

    info!(
        identifiers = identifiers.len(),
        database = %settings.database.display(),
        catalog = %settings.pipeline.catalog_base_url,
        "catalog-ingest starting"
    );

    let progress = BatchProgress::new(
        terminal::should_show_progress(
            io::stderr().is_terminal(),
            args.quiet,
            args.no_progress,
            terminal::is_dumb_terminal(),
        ),
        identifiers.len(),
    );
    let stats = run_batch(&pipeline, &identifiers, settings.batch, |snapshot| {
        progress.update(snapshot);
    })
    .await;
    progress.finish();

    match repository.count().await {
        Ok(stored) => info!(stored, "datasets in store"),
        Err(err) => warn!(error = %err, "could not count stored datasets"),
    }

    if !args.quiet {
        print!("{}", stats.summary());
    }

    drop(pipeline);
    db.close().await;

    Ok(stats.exit_outcome().code())
}
