//! Sequential batch processing over an identifier list.
//!
//! Each identifier moves through [`Stage`]s independently; a failure is
//! recorded with the stage it happened in and the batch moves on.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument};

use crate::model::SourceFormat;
use crate::pipeline::{FailureKind, Pipeline};

/// Default number of identifiers between progress snapshots.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

/// Default pause after each progress snapshot.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(500);

/// Failed identifiers listed in the summary before truncating.
const SUMMARY_FAILURE_LIMIT: usize = 10;

/// Where an identifier is in its pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Pending,
    Extracting,
    Reconciling,
    Persisting,
    Succeeded,
    Failed,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Reconciling => "reconciling",
            Self::Persisting => "persisting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// True for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process exit status for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Every identifier succeeded, or there were none.
    Success,
    /// Some identifiers failed and some succeeded.
    Partial,
    /// Every identifier failed, or the run could not start.
    Failure,
}

impl ProcessExit {
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

/// Maps success and failure counts to the process exit status.
#[must_use]
pub fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Parses an identifier list: one per line, `#` comments and blanks skipped.
/// Duplicates are kept in order.
#[must_use]
pub fn read_identifiers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads and parses an identifier list file.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be read.
pub fn read_identifiers_file(path: &Path) -> std::io::Result<Vec<String>> {
    std::fs::read_to_string(path).map(|text| read_identifiers(&text))
}

/// One identifier that did not make it to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedIdentifier {
    pub identifier: String,
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

/// Counters accumulated over a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<FailedIdentifier>,
    /// Succeeded datasets that carry each format.
    pub format_yield: BTreeMap<SourceFormat, usize>,
    pub elapsed: Duration,
}

impl BatchStats {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failed identifiers per failure kind.
    #[must_use]
    pub fn failure_counts(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Share of succeeded datasets that carry `format`, in percent.
    #[must_use]
    pub fn yield_percent(&self, format: SourceFormat) -> f64 {
        if self.succeeded == 0 {
            return 0.0;
        }
        let count = self.format_yield.get(&format).copied().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let percent = count as f64 * 100.0 / self.succeeded as f64;
        percent
    }

    #[must_use]
    pub fn exit_outcome(&self) -> ProcessExit {
        determine_exit_outcome(self.succeeded, self.failed())
    }

    /// Multi-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Processed: {}", self.attempted);
        let _ = writeln!(out, "Succeeded: {}", self.succeeded);
        let _ = writeln!(out, "Failed:    {}", self.failed());
        let _ = writeln!(out, "Elapsed:   {:.1}s", self.elapsed.as_secs_f64());
        let _ = writeln!(out, "Format yield:");
        for format in SourceFormat::ALL {
            let _ = writeln!(
                out,
                "  {:<7}{:>5} ({:.1}%)",
                format.as_str(),
                self.format_yield.get(&format).copied().unwrap_or(0),
                self.yield_percent(format)
            );
        }
        if !self.failures.is_empty() {
            let _ = writeln!(out, "Failure kinds:");
            for (kind, count) in self.failure_counts() {
                let _ = writeln!(out, "  {kind:<21}{count:>5}");
            }
            let _ = writeln!(out, "Failed identifiers:");
            for failure in self.failures.iter().take(SUMMARY_FAILURE_LIMIT) {
                let _ = writeln!(
                    out,
                    "  {} [{}] {}",
                    failure.identifier, failure.stage, failure.message
                );
            }
            if self.failures.len() > SUMMARY_FAILURE_LIMIT {
                let _ = writeln!(
                    out,
                    "  … and {} more",
                    self.failures.len() - SUMMARY_FAILURE_LIMIT
                );
            }
        }
        out
    }
}

/// State passed to the progress observer after each identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Pacing for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Identifiers between progress logs and pauses; 0 disables both.
    pub progress_interval: usize,
    pub pause: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

/// Runs `pipeline` over every identifier in order.
///
/// `observer` is called after each identifier finishes, whatever its outcome.
#[instrument(skip_all, fields(total = identifiers.len()))]
pub async fn run_batch(
    pipeline: &Pipeline,
    identifiers: &[String],
    options: BatchOptions,
    mut observer: impl FnMut(&ProgressSnapshot),
) -> BatchStats {
    let started = Instant::now();
    let total = identifiers.len();
    let mut stats = BatchStats::default();

    info!(total, "batch started");

    for (index, identifier) in identifiers.iter().enumerate() {
        stats.attempted += 1;
        let mut stage = Stage::Pending;
        debug!(identifier = %identifier, %stage, "identifier queued");

        let outcome = pipeline
            .process_with(identifier, |next| {
                debug!(identifier = %identifier, stage = %next, "stage entered");
                stage = next;
            })
            .await;

        match outcome {
            Ok(processed) => {
                stats.succeeded += 1;
                for format in processed.source_formats() {
                    *stats.format_yield.entry(format).or_insert(0) += 1;
                }
                debug!(identifier = %identifier, stage = %Stage::Succeeded, "identifier done");
            }
            Err(err) => {
                error!(
                    identifier = %identifier,
                    stage = %err.stage(),
                    kind = %err.failure_kind(),
                    last_stage = %stage,
                    outcome = %Stage::Failed,
                    error = %err,
                    "identifier failed"
                );
                stats.failures.push(FailedIdentifier {
                    identifier: identifier.clone(),
                    stage: err.stage(),
                    kind: err.failure_kind(),
                    message: err.to_string(),
                });
            }
        }

        let processed = index + 1;
        observer(&ProgressSnapshot {
            processed,
            total,
            succeeded: stats.succeeded,
            failed: stats.failed(),
        });

        if options.progress_interval > 0
            && processed % options.progress_interval == 0
            && processed < total
        {
            info!(
                processed,
                total,
                succeeded = stats.succeeded,
                failed = stats.failed(),
                "batch progress"
            );
            if !options.pause.is_zero() {
                tokio::time::sleep(options.pause).await;
            }
        }
    }

    stats.elapsed = started.elapsed();
    info!(
        attempted = stats.attempted,
        succeeded = stats.succeeded,
        failed = stats.failed(),
        elapsed_ms = u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
        "batch finished"
    );
    stats
}
