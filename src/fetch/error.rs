//! Error types for the fetch module.

use thiserror::Error;

/// Errors that can occur while fetching a source document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The locator is empty, unparseable or not http(s).
    #[error("invalid source locator '{url}': {reason}")]
    InvalidLocator {
        /// The rejected locator.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Every permitted attempt failed; carries the final failure.
    #[error("gave up fetching {url} after {attempts} attempt(s): {last}")]
    Exhausted {
        /// The URL that could not be fetched.
        url: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure from the final attempt.
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Creates an invalid locator error.
    pub fn invalid_locator(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a network error, promoting reqwest timeouts to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Returns the URL associated with this error.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidLocator { url, .. }
            | Self::Network { url, .. }
            | Self::Timeout { url }
            | Self::HttpStatus { url, .. }
            | Self::Exhausted { url, .. } => url,
        }
    }
}
