//! Extract → reconcile → persist for a single identifier.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::batch::Stage;
use crate::extract::{CatalogLocators, DEFAULT_CATALOG_BASE_URL, ExtractionError, Extractor};
use crate::fetch::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, FetchError, HttpClient, HttpTimeouts, RetryPolicy,
};
use crate::model::{Dataset, SourceFormat};
use crate::reconcile::{FieldProvenance, ReconcileError, Reconciled, reconcile};
use crate::repository::{DatasetStore, DbErrorKind, RepositoryError};

/// Settings for one pipeline, built from CLI flags and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Catalog root the four locator templates hang off.
    pub catalog_base_url: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeouts: HttpTimeouts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }

    #[must_use]
    pub fn locators(&self) -> CatalogLocators {
        CatalogLocators::from_base_url(&self.catalog_base_url)
    }
}

/// Failure of a single identifier after extraction.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("persistence failed: {0}")]
    Persist(#[from] RepositoryError),
}

impl PipelineError {
    /// The stage that failed.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Reconcile(_) => Stage::Reconciling,
            Self::Persist(_) => Stage::Persisting,
        }
    }

    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Reconcile(ReconcileError::NoSources { .. }) => FailureKind::NoSources,
            Self::Reconcile(ReconcileError::MissingTitle { .. }) => FailureKind::MissingTitle,
            Self::Persist(RepositoryError::Invalid(_)) => FailureKind::InvalidRecord,
            Self::Persist(err) => match err.database_kind() {
                Some(DbErrorKind::ConstraintViolation) => FailureKind::ConstraintViolation,
                Some(DbErrorKind::BusyOrLocked | DbErrorKind::PoolTimeout) => {
                    FailureKind::StorageBusy
                }
                Some(DbErrorKind::Other) | None => FailureKind::Storage,
            },
        }
    }
}

/// Why an identifier failed, coarse enough to count across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    NoSources,
    MissingTitle,
    InvalidRecord,
    /// The store rejected the record, e.g. a surrogate id owned by another dataset.
    ConstraintViolation,
    StorageBusy,
    Storage,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSources => "no_sources",
            Self::MissingTitle => "missing_title",
            Self::InvalidRecord => "invalid_record",
            Self::ConstraintViolation => "constraint_violation",
            Self::StorageBusy => "storage_busy",
            Self::Storage => "storage_failure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A dataset that was reconciled and stored.
#[derive(Debug)]
pub struct ProcessedDataset {
    pub id: Uuid,
    pub dataset: Dataset,
    pub provenance: FieldProvenance,
    /// Formats that failed for this identifier without failing it.
    pub extraction_failures: Vec<ExtractionError>,
}

impl ProcessedDataset {
    /// Formats that contributed a record.
    #[must_use]
    pub fn source_formats(&self) -> Vec<SourceFormat> {
        self.dataset.source_formats()
    }
}

/// Owns the HTTP client and the store for the life of a run.
#[derive(Clone)]
pub struct Pipeline {
    extractor: Extractor,
    store: Arc<dyn DatasetStore>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds the HTTP client and extractor from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the HTTP client cannot be constructed.
    pub fn new(config: &PipelineConfig, store: Arc<dyn DatasetStore>) -> Result<Self, FetchError> {
        let client = HttpClient::new(config.timeouts)?;
        let extractor = Extractor::new(client, config.retry_policy(), config.locators());
        Ok(Self::with_extractor(extractor, store))
    }

    #[must_use]
    pub fn with_extractor(extractor: Extractor, store: Arc<dyn DatasetStore>) -> Self {
        Self { extractor, store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DatasetStore> {
        &self.store
    }

    /// Runs all stages for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Reconcile`] when no format produced a record
    /// and [`PipelineError::Persist`] when the write fails.
    pub async fn process(&self, identifier: &str) -> Result<ProcessedDataset, PipelineError> {
        self.process_with(identifier, |_| {}).await
    }

    /// Like [`Self::process`], reporting each stage as it is entered.
    ///
    /// # Errors
    ///
    /// Same as [`Self::process`].
    #[instrument(skip(self, on_stage))]
    pub async fn process_with(
        &self,
        identifier: &str,
        mut on_stage: impl FnMut(Stage) + Send,
    ) -> Result<ProcessedDataset, PipelineError> {
        on_stage(Stage::Extracting);
        let report = self.extractor.extract_all(identifier).await;

        on_stage(Stage::Reconciling);
        let Reconciled {
            dataset,
            provenance,
        } = reconcile(identifier, &report.sources)?;

        on_stage(Stage::Persisting);
        let id = self.store.replace(&dataset).await?;

        info!(
            %id,
            file_identifier = %dataset.file_identifier,
            formats = ?dataset.source_formats(),
            failed_formats = report.failures.len(),
            "dataset stored"
        );
        if dataset.file_identifier != identifier.trim() {
            warn!(
                requested = identifier,
                stored = %dataset.file_identifier,
                "catalog returned a different file identifier"
            );
        }

        Ok(ProcessedDataset {
            id,
            dataset,
            provenance,
            extraction_failures: report.failures,
        })
    }
}
