//! Canonical dataset record and its owned collections.
//!
//! A [`Dataset`] is built fresh by reconciliation for every pipeline run and
//! handed to the repository as a whole. Extents are shaped so that partial
//! values cannot be represented: a [`SpatialExtent`] always carries four
//! bounds and a [`TemporalExtent`] always carries at least one date.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One of the four document formats the catalog publishes per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// ISO-19115 (gmd) XML.
    Xml,
    /// Catalog-native JSON.
    Json,
    /// Schema.org JSON-LD.
    JsonLd,
    /// DCAT RDF serialized as Turtle.
    Rdf,
}

impl SourceFormat {
    /// All formats in raw-document order.
    pub const ALL: [Self; 4] = [Self::Xml, Self::Json, Self::JsonLd, Self::Rdf];

    /// Returns the storage label for this format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::JsonLd => "jsonld",
            Self::Rdf => "rdf",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "jsonld" => Ok(Self::JsonLd),
            "rdf" => Ok(Self::Rdf),
            other => Err(format!("unknown source format: {other}")),
        }
    }
}

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl SpatialExtent {
    /// Builds an extent only when all four bounds are present.
    #[must_use]
    pub fn from_bounds(
        west: Option<f64>,
        east: Option<f64>,
        south: Option<f64>,
        north: Option<f64>,
    ) -> Option<Self> {
        Some(Self {
            west: west?,
            east: east?,
            south: south?,
            north: north?,
        })
    }
}

/// Time coverage of a dataset. At least one end is always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalExtent {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl TemporalExtent {
    /// Returns `None` when neither start nor end is known.
    #[must_use]
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            None
        } else {
            Some(Self { start, end })
        }
    }

    #[must_use]
    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }
}

/// Responsible party attached to a dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Catalog role code, e.g. `author` or `pointOfContact`. Never empty.
    pub role: String,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub full_name: Option<String>,
    pub honorific_prefix: Option<String>,
    pub organization_name: Option<String>,
    /// ROR identifier of the organisation.
    pub organization_identifier: Option<String>,
    pub email: Option<String>,
    /// ORCID of the individual.
    pub name_identifier: Option<String>,
    /// Postal address as published by the catalog.
    pub address: Option<serde_json::Value>,
    /// Accepted for compatibility, never stored.
    #[serde(default, skip_serializing)]
    pub position_name: Option<String>,
    /// Accepted for compatibility, never stored.
    #[serde(default, skip_serializing)]
    pub individual_name: Option<String>,
}

/// Vocabulary a keyword was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordType {
    Theme,
    Other,
    Project,
    Place,
}

impl KeywordType {
    /// Returns the storage label for this keyword type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::Other => "other",
            Self::Project => "project",
            Self::Place => "place",
        }
    }
}

impl FromStr for KeywordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theme" => Ok(Self::Theme),
            "other" => Ok(Self::Other),
            "project" => Ok(Self::Project),
            "place" => Ok(Self::Place),
            other => Err(format!("unknown keyword type: {other}")),
        }
    }
}

/// Subject keyword with optional vocabulary links.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub keyword_type: Option<KeywordType>,
    pub uri: Option<String>,
    /// Defined term set the keyword belongs to, taken from JSON-LD.
    pub in_defined_term_set: Option<String>,
    /// Accepted for compatibility, never stored.
    #[serde(default, skip_serializing)]
    pub thesaurus: Option<String>,
}

impl Keyword {
    /// Creates a keyword with a type tag and optional URI.
    #[must_use]
    pub fn new(keyword: impl Into<String>, keyword_type: KeywordType, uri: Option<String>) -> Self {
        Self {
            keyword: keyword.into(),
            keyword_type: Some(keyword_type),
            uri,
            ..Self::default()
        }
    }
}

/// Link from this dataset to another catalog entry. The target is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub relation_type: String,
    pub target_dataset_id: String,
}

/// Downloadable or informational resource linked from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnlineResource {
    pub url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub function: Option<String>,
    pub resource_type: Option<String>,
}

/// Archived copy of a fetched source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub format: SourceFormat,
    pub content: String,
    pub file_size: u64,
    pub downloaded_at: NaiveDateTime,
}

impl RawDocument {
    /// Wraps fetched text, recording its byte length and the fetch time.
    #[must_use]
    pub fn new(format: SourceFormat, content: String, downloaded_at: NaiveDateTime) -> Self {
        let file_size = content.len() as u64;
        Self {
            format,
            content,
            file_size,
            downloaded_at,
        }
    }
}

/// Canonical reconciled dataset record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Surrogate id, assigned on first persist.
    pub id: Option<Uuid>,
    pub file_identifier: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub lineage: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub metadata_date: Option<NaiveDateTime>,
    pub updated_date: Option<NaiveDate>,
    pub metadata_standard: Option<String>,
    pub metadata_standard_version: Option<String>,
    pub language: Option<String>,
    pub resource_status: Option<String>,
    pub resource_type: Option<String>,
    pub spatial_extent: Option<SpatialExtent>,
    pub temporal_extent: Option<TemporalExtent>,
    pub credit_text: Option<String>,
    pub is_accessible_for_free: Option<bool>,
    pub additional_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub contacts: Vec<Contact>,
    pub keywords: Vec<Keyword>,
    pub relationships: Vec<Relationship>,
    pub online_resources: Vec<OnlineResource>,
    pub raw_documents: Vec<RawDocument>,
    /// Accepted for compatibility, never stored.
    #[serde(default, skip_serializing)]
    pub purpose: Option<String>,
    /// Accepted for compatibility, never stored.
    #[serde(default, skip_serializing)]
    pub creation_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A dataset that violates a record invariant and must not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDataset {
    #[error("file identifier is empty")]
    EmptyFileIdentifier,

    #[error("title is empty for {file_identifier}")]
    EmptyTitle { file_identifier: String },

    #[error("contact #{index} has no role")]
    ContactWithoutRole { index: usize },

    #[error("keyword #{index} has no text")]
    EmptyKeyword { index: usize },

    #[error("more than one {0} raw document")]
    DuplicateRawDocument(SourceFormat),
}

impl Dataset {
    /// Checks the invariants storage relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidDataset`] violation found.
    pub fn validate(&self) -> Result<(), InvalidDataset> {
        if self.file_identifier.trim().is_empty() {
            return Err(InvalidDataset::EmptyFileIdentifier);
        }
        if self.title.trim().is_empty() {
            return Err(InvalidDataset::EmptyTitle {
                file_identifier: self.file_identifier.clone(),
            });
        }
        if let Some(index) = self.contacts.iter().position(|c| c.role.trim().is_empty()) {
            return Err(InvalidDataset::ContactWithoutRole { index });
        }
        if let Some(index) = self.keywords.iter().position(|k| k.keyword.trim().is_empty()) {
            return Err(InvalidDataset::EmptyKeyword { index });
        }
        for (i, doc) in self.raw_documents.iter().enumerate() {
            if self.raw_documents[..i].iter().any(|d| d.format == doc.format) {
                return Err(InvalidDataset::DuplicateRawDocument(doc.format));
            }
        }
        Ok(())
    }

    /// Formats that contributed a raw document.
    #[must_use]
    pub fn source_formats(&self) -> Vec<SourceFormat> {
        self.raw_documents.iter().map(|d| d.format).collect()
    }

    /// Flattened free text used by the semantic search indexer.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str()];
        parts.extend(self.abstract_text.as_deref());
        parts.extend(self.description.as_deref());
        parts.extend(self.lineage.as_deref());
        parts.extend(self.keywords.iter().map(|k| k.keyword.as_str()));
        for contact in &self.contacts {
            parts.extend(contact.full_name.as_deref());
            parts.extend(contact.organization_name.as_deref());
        }
        parts.extend(self.credit_text.as_deref());

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
