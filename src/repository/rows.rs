//! Row types and the mapping between [`Dataset`] and its tables.
//!
//! Dates are stored as ISO text, spatial bounds as decimal text and JSON
//! values (additional metadata, contact address) as serialized JSON. Fields
//! kept only for input compatibility are dropped on the way in.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::FromRow;
use uuid::Uuid;

use super::RepositoryError;
use crate::model::{
    Contact, Dataset, Keyword, KeywordType, OnlineResource, RawDocument, Relationship, SourceFormat,
    SpatialExtent, TemporalExtent,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// Format produced by `SQLite` `datetime('now')`.
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct DatasetRow {
    pub id: String,
    pub file_identifier: String,
    pub title: String,
    #[sqlx(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub lineage: Option<String>,
    pub publication_date: Option<String>,
    pub metadata_date: Option<String>,
    pub updated_date: Option<String>,
    pub metadata_standard: Option<String>,
    pub metadata_standard_version: Option<String>,
    pub language: Option<String>,
    pub resource_status: Option<String>,
    pub resource_type: Option<String>,
    pub bbox_west: Option<String>,
    pub bbox_east: Option<String>,
    pub bbox_south: Option<String>,
    pub bbox_north: Option<String>,
    pub temporal_start: Option<String>,
    pub temporal_end: Option<String>,
    pub credit_text: Option<String>,
    pub is_accessible_for_free: Option<bool>,
    pub additional_metadata: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct ContactRow {
    pub role: String,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub full_name: Option<String>,
    pub honorific_prefix: Option<String>,
    pub organization_name: Option<String>,
    pub organization_identifier: Option<String>,
    pub email: Option<String>,
    pub name_identifier: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct KeywordRow {
    pub keyword: String,
    pub keyword_type: Option<String>,
    pub uri: Option<String>,
    pub in_defined_term_set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct RelationshipRow {
    pub relation_type: String,
    pub target_dataset_id: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct OnlineResourceRow {
    pub url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub function: Option<String>,
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct DocumentRow {
    pub format: String,
    pub content: String,
    pub file_size: i64,
    pub downloaded_at: String,
}

/// A dataset split into its table rows.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredDataset {
    pub dataset: DatasetRow,
    pub contacts: Vec<ContactRow>,
    pub keywords: Vec<KeywordRow>,
    pub relationships: Vec<RelationshipRow>,
    pub online_resources: Vec<OnlineResourceRow>,
    pub documents: Vec<DocumentRow>,
}

// ==================== To Storage ====================

pub(crate) fn to_storage(dataset: &Dataset, id: Uuid) -> StoredDataset {
    let spatial = dataset.spatial_extent;
    let temporal = dataset.temporal_extent;

    StoredDataset {
        dataset: DatasetRow {
            id: id.to_string(),
            file_identifier: dataset.file_identifier.trim().to_string(),
            title: dataset.title.clone(),
            abstract_text: dataset.abstract_text.clone(),
            description: dataset.description.clone(),
            lineage: dataset.lineage.clone(),
            publication_date: dataset.publication_date.map(format_date),
            metadata_date: dataset.metadata_date.map(format_datetime),
            updated_date: dataset.updated_date.map(format_date),
            metadata_standard: dataset.metadata_standard.clone(),
            metadata_standard_version: dataset.metadata_standard_version.clone(),
            language: dataset.language.clone(),
            resource_status: dataset.resource_status.clone(),
            resource_type: dataset.resource_type.clone(),
            bbox_west: spatial.map(|s| s.west.to_string()),
            bbox_east: spatial.map(|s| s.east.to_string()),
            bbox_south: spatial.map(|s| s.south.to_string()),
            bbox_north: spatial.map(|s| s.north.to_string()),
            temporal_start: temporal.and_then(|t| t.start()).map(format_date),
            temporal_end: temporal.and_then(|t| t.end()).map(format_date),
            credit_text: dataset.credit_text.clone(),
            is_accessible_for_free: dataset.is_accessible_for_free,
            additional_metadata: dataset
                .additional_metadata
                .clone()
                .map(|m| serde_json::Value::Object(m).to_string()),
            created_at: dataset
                .created_at
                .map(|t| t.format(SQLITE_TIMESTAMP_FORMAT).to_string()),
            updated_at: None,
        },
        contacts: dataset
            .contacts
            .iter()
            .map(|c| ContactRow {
                role: c.role.clone(),
                family_name: c.family_name.clone(),
                given_name: c.given_name.clone(),
                full_name: c.full_name.clone(),
                honorific_prefix: c.honorific_prefix.clone(),
                organization_name: c.organization_name.clone(),
                organization_identifier: c.organization_identifier.clone(),
                email: c.email.clone(),
                name_identifier: c.name_identifier.clone(),
                address: c.address.as_ref().map(ToString::to_string),
            })
            .collect(),
        keywords: dataset
            .keywords
            .iter()
            .map(|k| KeywordRow {
                keyword: k.keyword.clone(),
                keyword_type: k.keyword_type.map(|t| t.as_str().to_string()),
                uri: k.uri.clone(),
                in_defined_term_set: k.in_defined_term_set.clone(),
            })
            .collect(),
        relationships: dataset
            .relationships
            .iter()
            .map(|r| RelationshipRow {
                relation_type: r.relation_type.clone(),
                target_dataset_id: r.target_dataset_id.clone(),
            })
            .collect(),
        online_resources: dataset
            .online_resources
            .iter()
            .map(|r| OnlineResourceRow {
                url: r.url.clone(),
                name: r.name.clone(),
                description: r.description.clone(),
                function: r.function.clone(),
                resource_type: r.resource_type.clone(),
            })
            .collect(),
        documents: dataset
            .raw_documents
            .iter()
            .map(|d| DocumentRow {
                format: d.format.as_str().to_string(),
                content: d.content.clone(),
                file_size: i64::try_from(d.file_size).unwrap_or(i64::MAX),
                downloaded_at: format_datetime(d.downloaded_at),
            })
            .collect(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

// ==================== From Storage ====================

pub(crate) fn from_storage(stored: StoredDataset) -> Result<Dataset, RepositoryError> {
    let row = stored.dataset;

    let id = Uuid::parse_str(&row.id).map_err(|_| RepositoryError::corrupt("id", &row.id))?;
    let spatial_extent = SpatialExtent::from_bounds(
        parse_bound("bbox_west", row.bbox_west.as_deref())?,
        parse_bound("bbox_east", row.bbox_east.as_deref())?,
        parse_bound("bbox_south", row.bbox_south.as_deref())?,
        parse_bound("bbox_north", row.bbox_north.as_deref())?,
    );
    let temporal_extent = TemporalExtent::new(
        parse_stored_date("temporal_start", row.temporal_start.as_deref())?,
        parse_stored_date("temporal_end", row.temporal_end.as_deref())?,
    );
    let additional_metadata = match row.additional_metadata.as_deref() {
        None => None,
        Some(text) => match serde_json::from_str(text) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => return Err(RepositoryError::corrupt("additional_metadata", text)),
        },
    };

    Ok(Dataset {
        id: Some(id),
        file_identifier: row.file_identifier,
        title: row.title,
        abstract_text: row.abstract_text,
        description: row.description,
        lineage: row.lineage,
        publication_date: parse_stored_date("publication_date", row.publication_date.as_deref())?,
        metadata_date: parse_stored_datetime("metadata_date", row.metadata_date.as_deref())?,
        updated_date: parse_stored_date("updated_date", row.updated_date.as_deref())?,
        metadata_standard: row.metadata_standard,
        metadata_standard_version: row.metadata_standard_version,
        language: row.language,
        resource_status: row.resource_status,
        resource_type: row.resource_type,
        spatial_extent,
        temporal_extent,
        credit_text: row.credit_text,
        is_accessible_for_free: row.is_accessible_for_free,
        additional_metadata,
        contacts: stored
            .contacts
            .into_iter()
            .map(contact_from_row)
            .collect::<Result<_, _>>()?,
        keywords: stored
            .keywords
            .into_iter()
            .map(keyword_from_row)
            .collect::<Result<_, _>>()?,
        relationships: stored
            .relationships
            .into_iter()
            .map(|r| Relationship {
                relation_type: r.relation_type,
                target_dataset_id: r.target_dataset_id,
            })
            .collect(),
        online_resources: stored
            .online_resources
            .into_iter()
            .map(|r| OnlineResource {
                url: r.url,
                name: r.name,
                description: r.description,
                function: r.function,
                resource_type: r.resource_type,
            })
            .collect(),
        raw_documents: stored
            .documents
            .into_iter()
            .map(document_from_row)
            .collect::<Result<_, _>>()?,
        purpose: None,
        creation_date: None,
        created_at: parse_stored_datetime("created_at", row.created_at.as_deref())?,
        updated_at: parse_stored_datetime("updated_at", row.updated_at.as_deref())?,
    })
}

fn contact_from_row(row: ContactRow) -> Result<Contact, RepositoryError> {
    let address = match row.address {
        None => None,
        Some(text) => Some(
            serde_json::from_str(&text).map_err(|_| RepositoryError::corrupt("address", text))?,
        ),
    };
    Ok(Contact {
        role: row.role,
        family_name: row.family_name,
        given_name: row.given_name,
        full_name: row.full_name,
        honorific_prefix: row.honorific_prefix,
        organization_name: row.organization_name,
        organization_identifier: row.organization_identifier,
        email: row.email,
        name_identifier: row.name_identifier,
        address,
        position_name: None,
        individual_name: None,
    })
}

fn keyword_from_row(row: KeywordRow) -> Result<Keyword, RepositoryError> {
    let keyword_type = row
        .keyword_type
        .map(|t| {
            t.parse::<KeywordType>()
                .map_err(|_| RepositoryError::corrupt("keyword_type", t))
        })
        .transpose()?;
    Ok(Keyword {
        keyword: row.keyword,
        keyword_type,
        uri: row.uri,
        in_defined_term_set: row.in_defined_term_set,
        thesaurus: None,
    })
}

fn document_from_row(row: DocumentRow) -> Result<RawDocument, RepositoryError> {
    let format: SourceFormat = row
        .format
        .parse()
        .map_err(|_| RepositoryError::corrupt("format", &row.format))?;
    let file_size = u64::try_from(row.file_size)
        .map_err(|_| RepositoryError::corrupt("file_size", row.file_size.to_string()))?;
    let downloaded_at = parse_stored_datetime("downloaded_at", Some(&row.downloaded_at))?
        .ok_or_else(|| RepositoryError::corrupt("downloaded_at", &row.downloaded_at))?;
    Ok(RawDocument {
        format,
        content: row.content,
        file_size,
        downloaded_at,
    })
}

fn parse_bound(field: &'static str, value: Option<&str>) -> Result<Option<f64>, RepositoryError> {
    value
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| RepositoryError::corrupt(field, v))
        })
        .transpose()
}

fn parse_stored_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, RepositoryError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, DATE_FORMAT).map_err(|_| RepositoryError::corrupt(field, v))
        })
        .transpose()
}

fn parse_stored_datetime(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, RepositoryError> {
    value
        .map(|v| {
            NaiveDateTime::parse_from_str(v, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(v, SQLITE_TIMESTAMP_FORMAT))
                .map_err(|_| RepositoryError::corrupt(field, v))
        })
        .transpose()
}
