//! Tracing setup and progress bar for interactive runs.

use indicatif::{ProgressBar, ProgressStyle};

use catalog_ingest_core::ProgressSnapshot;

/// Default filter directive from `-q`/`-v`; `RUST_LOG` still wins.
pub(crate) fn default_log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_show_progress(
    stderr_is_terminal: bool,
    quiet: bool,
    no_progress: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !no_progress && !dumb_terminal
}

/// Bar over the identifier list, advanced once per finished identifier.
pub(crate) struct BatchProgress {
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    pub(crate) fn new(enabled: bool, total: usize) -> Self {
        if !enabled {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar: Some(bar) }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }

    pub(crate) fn update(&self, snapshot: &ProgressSnapshot) {
        let Some(bar) = &self.bar else {
            return;
        };
        bar.set_position(u64::try_from(snapshot.processed).unwrap_or(u64::MAX));
        bar.set_message(format!(
            "ok {} failed {}",
            snapshot.succeeded, snapshot.failed
        ));
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
