//! HTTP client wrapper for fetching catalog documents.
//!
//! One [`HttpClient`] is built per run and reused for every document so the
//! connection pool is shared across formats and identifiers.

use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::user_agent;

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeouts applied to every catalog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A successfully fetched document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// The locator that was fetched.
    pub url: String,
    /// Raw response body.
    pub body: Vec<u8>,
    /// When the body finished downloading (UTC).
    pub fetched_at: NaiveDateTime,
}

/// HTTP client for catalog document fetches.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client with the given timeouts and the project user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialised.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.read)
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()
            .map_err(|e| FetchError::network("<client>", e))?;
        Ok(Self { client })
    }

    /// Performs a single GET and returns the body on 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidLocator`] for non-http(s) locators,
    /// [`FetchError::HttpStatus`] for non-success responses, and
    /// [`FetchError::Network`]/[`FetchError::Timeout`] for transport failures.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_once(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        validate_locator(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        debug!(bytes = body.len(), "fetched document");

        Ok(FetchedDocument {
            url: url.to_string(),
            body: body.to_vec(),
            fetched_at: Utc::now().naive_utc(),
        })
    }

    /// Fetches a document, retrying transient failures per `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidLocator`] immediately for a bad locator,
    /// otherwise [`FetchError::Exhausted`] wrapping the last failure.
    #[instrument(skip(self, policy), fields(url = %url, max_attempts = policy.max_attempts()))]
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        policy: &RetryPolicy,
    ) -> Result<FetchedDocument, FetchError> {
        validate_locator(url)?;

        let mut attempt = 1;
        loop {
            let error = match self.fetch_once(url).await {
                Ok(doc) => return Ok(doc),
                Err(error) => error,
            };

            match policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(attempt, error = %error, delay_ms = delay.as_millis(), "fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, reason = %reason, "giving up");
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
            }
        }
    }
}

/// Accepts only non-empty absolute http(s) locators.
///
/// # Errors
///
/// Returns [`FetchError::InvalidLocator`] describing the problem.
pub fn validate_locator(url: &str) -> Result<(), FetchError> {
    if url.trim().is_empty() {
        return Err(FetchError::invalid_locator(url, "locator is empty"));
    }
    let parsed = Url::parse(url).map_err(|e| FetchError::invalid_locator(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::invalid_locator(
            url,
            format!("unsupported scheme '{other}'"),
        )),
    }
}
