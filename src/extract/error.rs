//! Error types for document extraction.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::model::SourceFormat;

/// Why a single format produced no record for an identifier.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document could not be fetched (bad locator or retries exhausted).
    #[error("{format} source unavailable: {source}")]
    SourceUnavailable {
        format: SourceFormat,
        #[source]
        source: FetchError,
    },

    /// The document was fetched but is malformed for its format.
    #[error("{format} parse failure: {message}")]
    ParseFailure {
        format: SourceFormat,
        message: String,
    },

    /// The document parsed but lacks a required field.
    #[error("{format} validation failure: missing {missing}")]
    ValidationFailure {
        format: SourceFormat,
        missing: &'static str,
    },
}

impl ExtractionError {
    /// Creates a parse failure for `format`.
    pub fn parse_failure(format: SourceFormat, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            format,
            message: message.into(),
        }
    }

    /// The format whose extraction failed.
    #[must_use]
    pub fn format(&self) -> SourceFormat {
        match self {
            Self::SourceUnavailable { format, .. }
            | Self::ParseFailure { format, .. }
            | Self::ValidationFailure { format, .. } => *format,
        }
    }

    /// Short machine-readable kind label for logs and summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::ParseFailure { .. } => "parse_failure",
            Self::ValidationFailure { .. } => "validation_failure",
        }
    }
}
