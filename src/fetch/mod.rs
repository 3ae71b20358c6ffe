//! Catalog document fetching with bounded, fixed-delay retries.
//!
//! - [`HttpClient`] - shared reqwest client with connect/read timeouts
//! - [`RetryPolicy`] - attempt budget and constant pause between attempts
//! - [`FetchError`] - transport, status and locator failures

mod client;
mod error;
mod retry;

pub use client::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, FetchedDocument, HttpClient, HttpTimeouts,
    validate_locator,
};
pub use error::FetchError;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
