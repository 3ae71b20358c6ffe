//! Catalog Ingest Core Library
//!
//! Harvests environmental dataset metadata that a catalog publishes in four
//! formats (ISO-19115 XML, catalog JSON, Schema.org JSON-LD, RDF/Turtle),
//! reconciles them into one canonical [`Dataset`] and stores it in SQLite.
//!
//! # Architecture
//!
//! - [`fetch`] - HTTP client with fixed-delay retries
//! - [`extract`] - per-format parsers and the shared extraction template
//! - [`reconcile`] - field precedence and collection merging
//! - [`repository`] - dataset persistence on top of [`db`]
//! - [`pipeline`] - extract, reconcile and persist one identifier
//! - [`batch`] - sequential run over an identifier list
//!
//! ```no_run
//! use std::sync::Arc;
//! use catalog_ingest_core::{Database, DatasetRepository, Pipeline, PipelineConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new_in_memory().await?;
//! let pipeline = Pipeline::new(
//!     &PipelineConfig::default(),
//!     Arc::new(DatasetRepository::new(db)),
//! )?;
//! let processed = pipeline.process("eidc-001").await?;
//! println!("{} from {:?}", processed.dataset.title, processed.source_formats());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod repository;
mod user_agent;

// Re-export commonly used types
pub use batch::{
    BatchOptions, BatchStats, DEFAULT_BATCH_PAUSE, DEFAULT_PROGRESS_INTERVAL, FailedIdentifier,
    ProcessExit, ProgressSnapshot, Stage, determine_exit_outcome, read_identifiers,
    read_identifiers_file, run_batch,
};
pub use db::{Database, DatabaseOptions, DbError};
pub use extract::{
    CatalogLocators, DEFAULT_CATALOG_BASE_URL, ExtractedSources, ExtractionError,
    ExtractionReport, Extractor, SourceRecord, parse_document, parse_text,
};
pub use fetch::{FetchError, FetchedDocument, HttpClient, HttpTimeouts, RetryPolicy};
pub use model::{
    Contact, Dataset, InvalidDataset, Keyword, KeywordType, OnlineResource, RawDocument,
    Relationship, SourceFormat, SpatialExtent, TemporalExtent,
};
pub use pipeline::{FailureKind, Pipeline, PipelineConfig, PipelineError, ProcessedDataset};
pub use reconcile::{FieldProvenance, ReconcileError, Reconciled, reconcile};
pub use repository::{
    DatasetRepository, DatasetStore, DbErrorKind, ListQuery, RepositoryError, SortField,
    SortOrder,
};
