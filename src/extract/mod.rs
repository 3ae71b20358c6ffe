//! Per-format extraction of catalog documents.
//!
//! Every format goes through the same template in [`Extractor::extract`]:
//!
//! 1. validate the locator (non-empty, http or https)
//! 2. fetch with the configured fixed-delay [`RetryPolicy`]
//! 3. parse with the format's parser into a [`SourceRecord`]
//! 4. require a non-empty file identifier and title
//!
//! The parsers themselves are pure functions over document text and live in
//! one submodule per format.

mod dates;
mod error;
pub mod json;
pub mod jsonld;
pub mod rdf;
pub mod xml;
mod xml_tree;

use tracing::{debug, instrument, warn};

pub use dates::{parse_date, parse_datetime, parse_temporal_extent};
pub use error::ExtractionError;
pub use json::JsonRecord;
pub use jsonld::{JsonLdRecord, TermSetKeyword};
pub use rdf::RdfRecord;
pub use xml::XmlRecord;

use crate::fetch::{FetchedDocument, HttpClient, RetryPolicy};
use crate::model::{RawDocument, SourceFormat};

/// Default public catalog base URL.
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://catalogue.ceh.ac.uk";

/// Placeholder replaced by the URL-encoded identifier in locator templates.
const ID_PLACEHOLDER: &str = "{id}";

/// URL templates for the four published formats of one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLocators {
    xml: String,
    json: String,
    jsonld: String,
    rdf: String,
}

impl Default for CatalogLocators {
    fn default() -> Self {
        Self::from_base_url(DEFAULT_CATALOG_BASE_URL)
    }
}

impl CatalogLocators {
    /// Builds the standard `/documents/{id}` templates under `base_url`.
    #[must_use]
    pub fn from_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            xml: format!("{base}/documents/{ID_PLACEHOLDER}.xml"),
            json: format!("{base}/documents/{ID_PLACEHOLDER}?format=json"),
            jsonld: format!("{base}/documents/{ID_PLACEHOLDER}?format=schema.org"),
            rdf: format!("{base}/documents/{ID_PLACEHOLDER}?format=ttl"),
        }
    }

    /// Returns the template for `format`.
    #[must_use]
    pub fn template(&self, format: SourceFormat) -> &str {
        match format {
            SourceFormat::Xml => &self.xml,
            SourceFormat::Json => &self.json,
            SourceFormat::JsonLd => &self.jsonld,
            SourceFormat::Rdf => &self.rdf,
        }
    }

    /// Fills the template for `format` with `identifier`.
    #[must_use]
    pub fn locator(&self, format: SourceFormat, identifier: &str) -> String {
        self.template(format)
            .replace(ID_PLACEHOLDER, &urlencoding::encode(identifier.trim()))
    }
}

/// Intermediate record from one format, tagged by that format.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Xml(XmlRecord),
    Json(JsonRecord),
    JsonLd(JsonLdRecord),
    Rdf(RdfRecord),
}

impl SourceRecord {
    /// The format this record was parsed from.
    #[must_use]
    pub fn format(&self) -> SourceFormat {
        match self {
            Self::Xml(_) => SourceFormat::Xml,
            Self::Json(_) => SourceFormat::Json,
            Self::JsonLd(_) => SourceFormat::JsonLd,
            Self::Rdf(_) => SourceFormat::Rdf,
        }
    }

    #[must_use]
    pub fn file_identifier(&self) -> Option<&str> {
        match self {
            Self::Xml(r) => r.file_identifier.as_deref(),
            Self::Json(r) => r.file_identifier.as_deref(),
            Self::JsonLd(r) => r.file_identifier.as_deref(),
            Self::Rdf(r) => r.file_identifier.as_deref(),
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Xml(r) => r.title.as_deref(),
            Self::Json(r) => r.title.as_deref(),
            Self::JsonLd(r) => r.title.as_deref(),
            Self::Rdf(r) => r.title.as_deref(),
        }
    }

    fn set_raw(&mut self, raw: RawDocument) {
        match self {
            Self::Xml(r) => r.raw = Some(raw),
            Self::Json(r) => r.raw = Some(raw),
            Self::JsonLd(r) => r.raw = Some(raw),
            Self::Rdf(r) => r.raw = Some(raw),
        }
    }

    /// Requires a non-empty file identifier and title.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::ValidationFailure`] naming the missing field.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let present = |v: Option<&str>| v.is_some_and(|s| !s.trim().is_empty());
        let missing = if !present(self.file_identifier()) {
            "file identifier"
        } else if !present(self.title()) {
            "title"
        } else {
            return Ok(());
        };
        Err(ExtractionError::ValidationFailure {
            format: self.format(),
            missing,
        })
    }
}

/// Parses a fetched document as `format` and attaches its raw text.
///
/// # Errors
///
/// Returns [`ExtractionError::ParseFailure`] for non-UTF-8 bodies or
/// documents malformed for the format.
pub fn parse_document(
    format: SourceFormat,
    document: &FetchedDocument,
) -> Result<SourceRecord, ExtractionError> {
    let text = std::str::from_utf8(&document.body).map_err(|e| {
        ExtractionError::parse_failure(format, format!("document is not UTF-8: {e}"))
    })?;
    let mut record = parse_text(format, text)?;
    record.set_raw(RawDocument::new(
        format,
        text.to_string(),
        document.fetched_at,
    ));
    Ok(record)
}

/// Runs the format parser over document text.
///
/// # Errors
///
/// Returns [`ExtractionError::ParseFailure`] when the parser rejects the text.
pub fn parse_text(format: SourceFormat, text: &str) -> Result<SourceRecord, ExtractionError> {
    let parsed = match format {
        SourceFormat::Xml => xml::parse(text).map(SourceRecord::Xml),
        SourceFormat::Json => json::parse(text).map(SourceRecord::Json),
        SourceFormat::JsonLd => jsonld::parse(text).map(SourceRecord::JsonLd),
        SourceFormat::Rdf => rdf::parse(text).map(SourceRecord::Rdf),
    };
    parsed.map_err(|message| ExtractionError::parse_failure(format, message))
}

/// Up to one validated record per format for a single identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedSources {
    pub xml: Option<XmlRecord>,
    pub json: Option<JsonRecord>,
    pub jsonld: Option<JsonLdRecord>,
    pub rdf: Option<RdfRecord>,
}

impl ExtractedSources {
    /// Stores a record in its format slot, replacing any previous one.
    pub fn insert(&mut self, record: SourceRecord) {
        match record {
            SourceRecord::Xml(r) => self.xml = Some(r),
            SourceRecord::Json(r) => self.json = Some(r),
            SourceRecord::JsonLd(r) => self.jsonld = Some(r),
            SourceRecord::Rdf(r) => self.rdf = Some(r),
        }
    }

    /// True when no format produced a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xml.is_none() && self.json.is_none() && self.jsonld.is_none() && self.rdf.is_none()
    }

    /// Formats that produced a record, in raw-document order.
    #[must_use]
    pub fn formats(&self) -> Vec<SourceFormat> {
        SourceFormat::ALL
            .into_iter()
            .filter(|f| match f {
                SourceFormat::Xml => self.xml.is_some(),
                SourceFormat::Json => self.json.is_some(),
                SourceFormat::JsonLd => self.jsonld.is_some(),
                SourceFormat::Rdf => self.rdf.is_some(),
            })
            .collect()
    }
}

/// Outcome of extracting every format for one identifier.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub sources: ExtractedSources,
    pub failures: Vec<ExtractionError>,
}

/// Fetch-parse-validate template shared by all formats.
#[derive(Debug, Clone)]
pub struct Extractor {
    client: HttpClient,
    retry: RetryPolicy,
    locators: CatalogLocators,
}

impl Extractor {
    #[must_use]
    pub fn new(client: HttpClient, retry: RetryPolicy, locators: CatalogLocators) -> Self {
        Self {
            client,
            retry,
            locators,
        }
    }

    /// Returns the locator templates in use.
    #[must_use]
    pub fn locators(&self) -> &CatalogLocators {
        &self.locators
    }

    /// Extracts one format from an explicit locator.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::SourceUnavailable`] when the document
    /// cannot be fetched, [`ExtractionError::ParseFailure`] when it is
    /// malformed, and [`ExtractionError::ValidationFailure`] when it lacks
    /// an identifier or title.
    #[instrument(skip(self), fields(format = %format))]
    pub async fn extract(
        &self,
        format: SourceFormat,
        locator: &str,
    ) -> Result<SourceRecord, ExtractionError> {
        let document = self
            .client
            .fetch_with_retry(locator, &self.retry)
            .await
            .map_err(|source| ExtractionError::SourceUnavailable { format, source })?;

        let record = parse_document(format, &document)?;
        record.validate()?;

        debug!(
            file_identifier = record.file_identifier().unwrap_or_default(),
            bytes = document.body.len(),
            "extracted record"
        );
        Ok(record)
    }

    /// Extracts all four formats for `identifier` concurrently.
    ///
    /// Per-format failures are logged and collected; they never fail the call.
    #[instrument(skip(self))]
    pub async fn extract_all(&self, identifier: &str) -> ExtractionReport {
        let xml_url = self.locators.locator(SourceFormat::Xml, identifier);
        let json_url = self.locators.locator(SourceFormat::Json, identifier);
        let jsonld_url = self.locators.locator(SourceFormat::JsonLd, identifier);
        let rdf_url = self.locators.locator(SourceFormat::Rdf, identifier);

        let (xml, json, jsonld, rdf) = tokio::join!(
            self.extract(SourceFormat::Xml, &xml_url),
            self.extract(SourceFormat::Json, &json_url),
            self.extract(SourceFormat::JsonLd, &jsonld_url),
            self.extract(SourceFormat::Rdf, &rdf_url),
        );

        let mut report = ExtractionReport::default();
        for outcome in [xml, json, jsonld, rdf] {
            match outcome {
                Ok(record) => report.sources.insert(record),
                Err(error) => {
                    warn!(
                        identifier,
                        format = %error.format(),
                        kind = error.kind(),
                        error = %error,
                        "format extraction failed"
                    );
                    report.failures.push(error);
                }
            }
        }
        report
    }
}
