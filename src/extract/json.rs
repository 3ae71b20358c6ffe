//! Catalog-native JSON extractor.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::dates::{parse_date, parse_datetime, parse_temporal_extent};
use crate::model::{
    Contact, Keyword, KeywordType, OnlineResource, RawDocument, Relationship, SpatialExtent,
    TemporalExtent,
};

/// Fields read from a catalog JSON document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonRecord {
    pub file_identifier: Option<String>,
    pub title: Option<String>,
    /// The catalog's `description`, used as both abstract and description.
    pub description: Option<String>,
    pub lineage: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub metadata_date: Option<NaiveDateTime>,
    pub updated_date: Option<NaiveDate>,
    pub resource_status: Option<String>,
    pub resource_type: Option<String>,
    pub spatial_extent: Option<SpatialExtent>,
    pub temporal_extent: Option<TemporalExtent>,
    pub contacts: Vec<Contact>,
    pub keywords: Vec<Keyword>,
    pub relationships: Vec<Relationship>,
    pub online_resources: Vec<OnlineResource>,
    pub additional_metadata: Option<Map<String, Value>>,
    pub raw: Option<RawDocument>,
}

// ==================== Wire Types ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    lineage: Option<String>,
    publication_date: Option<String>,
    dataset_reference_date: Option<ReferenceDates>,
    metadata_date: Option<String>,
    updated_date: Option<String>,
    resource_status: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    bounding_boxes: Vec<BoundingBox>,
    #[serde(default, deserialize_with = "null_as_empty")]
    temporal_extents: Vec<TemporalEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    responsible_parties: Vec<ResponsibleParty>,
    #[serde(default, deserialize_with = "null_as_empty")]
    keywords_theme: Vec<Option<KeywordEntry>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    keywords_other: Vec<Option<KeywordEntry>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    keywords_project: Vec<Option<KeywordEntry>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    keywords_place: Vec<Option<KeywordEntry>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    relationships: Vec<RelationshipEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    online_resources: Vec<LinkEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    info_links: Vec<LinkEntry>,
    service: Option<Value>,
    spatial_resolutions: Option<Value>,
    distribution_formats: Option<Value>,
    funding: Option<Value>,
    inspire_themes: Option<Value>,
    spatial_reference_systems: Option<Value>,
    use_constraints: Option<Value>,
    licences: Option<Value>,
    topic_categories: Option<Value>,
}

/// Collections the catalog sends as `null` read as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceDates {
    publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBox {
    west_bound_longitude: Option<Decimal>,
    east_bound_longitude: Option<Decimal>,
    south_bound_latitude: Option<Decimal>,
    north_bound_latitude: Option<Decimal>,
}

/// Bounds arrive as JSON numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TemporalEntry {
    begin: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsibleParty {
    role: Option<String>,
    family_name: Option<String>,
    given_name: Option<String>,
    full_name: Option<String>,
    honorific_prefix: Option<String>,
    organisation_name: Option<String>,
    organisation_identifier: Option<String>,
    position_name: Option<String>,
    email: Option<String>,
    name_identifier: Option<String>,
    address: Option<Value>,
}

/// Keyword lists hold either `{value, uri}` objects or bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeywordEntry {
    Detailed {
        value: Option<String>,
        uri: Option<String>,
    },
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct RelationshipEntry {
    relation: Option<String>,
    target: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkEntry {
    url: Option<String>,
    name: Option<String>,
    description: Option<String>,
    function: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
}

// ==================== Mapping ====================

/// Parses a catalog JSON document.
///
/// # Errors
///
/// Returns the serde error text when the document is not valid JSON or a
/// known field has an unexpected shape.
pub fn parse(text: &str) -> Result<JsonRecord, String> {
    let doc: CatalogDocument = serde_json::from_str(text).map_err(|e| e.to_string())?;

    let publication_date = doc
        .publication_date
        .as_deref()
        .or_else(|| {
            doc.dataset_reference_date
                .as_ref()
                .and_then(|d| d.publication_date.as_deref())
        })
        .and_then(parse_date);

    let spatial_extent = doc.bounding_boxes.first().and_then(|b| {
        SpatialExtent::from_bounds(
            b.west_bound_longitude.as_ref().and_then(Decimal::value),
            b.east_bound_longitude.as_ref().and_then(Decimal::value),
            b.south_bound_latitude.as_ref().and_then(Decimal::value),
            b.north_bound_latitude.as_ref().and_then(Decimal::value),
        )
    });

    let temporal_extent = doc
        .temporal_extents
        .first()
        .and_then(|t| parse_temporal_extent(t.begin.as_deref(), t.end.as_deref()));

    let mut keywords = Vec::new();
    push_keywords(&mut keywords, &doc.keywords_theme, KeywordType::Theme);
    push_keywords(&mut keywords, &doc.keywords_other, KeywordType::Other);
    push_keywords(&mut keywords, &doc.keywords_project, KeywordType::Project);
    push_keywords(&mut keywords, &doc.keywords_place, KeywordType::Place);

    Ok(JsonRecord {
        file_identifier: non_blank(doc.id.as_deref()),
        title: non_blank(doc.title.as_deref()),
        description: non_blank(doc.description.as_deref()),
        lineage: non_blank(doc.lineage.as_deref()),
        publication_date,
        metadata_date: doc.metadata_date.as_deref().and_then(parse_datetime),
        updated_date: doc.updated_date.as_deref().and_then(parse_date),
        resource_status: non_blank(doc.resource_status.as_deref()),
        resource_type: non_blank(doc.resource_type.as_deref()),
        spatial_extent,
        temporal_extent,
        contacts: doc
            .responsible_parties
            .into_iter()
            .filter_map(contact)
            .collect(),
        keywords,
        relationships: doc
            .relationships
            .into_iter()
            .filter_map(relationship)
            .collect(),
        online_resources: doc
            .online_resources
            .into_iter()
            .chain(doc.info_links)
            .filter_map(online_resource)
            .collect(),
        additional_metadata: additional_metadata([
            ("service", doc.service),
            ("spatial_resolutions", doc.spatial_resolutions),
            ("distribution_formats", doc.distribution_formats),
            ("funding", doc.funding),
            ("inspire_themes", doc.inspire_themes),
            ("spatial_reference_systems", doc.spatial_reference_systems),
            ("use_constraints", doc.use_constraints),
            ("licences", doc.licences),
            ("topic_categories", doc.topic_categories),
        ]),
        raw: None,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parties without a role are dropped.
fn contact(party: ResponsibleParty) -> Option<Contact> {
    let role = non_blank(party.role.as_deref())?;
    Some(Contact {
        role,
        family_name: party.family_name,
        given_name: party.given_name,
        full_name: party.full_name,
        honorific_prefix: party.honorific_prefix,
        organization_name: party.organisation_name,
        organization_identifier: party.organisation_identifier,
        email: party.email,
        name_identifier: party.name_identifier,
        address: party.address.filter(|a| !a.is_null()),
        position_name: party.position_name,
        individual_name: None,
    })
}

fn push_keywords(
    out: &mut Vec<Keyword>,
    entries: &[Option<KeywordEntry>],
    keyword_type: KeywordType,
) {
    for entry in entries.iter().flatten() {
        let (value, uri) = match entry {
            KeywordEntry::Detailed { value, uri } => (value.as_deref(), uri.clone()),
            KeywordEntry::Plain(value) => (Some(value.as_str()), None),
        };
        let Some(value) = non_blank(value) else {
            continue;
        };
        let uri = if keyword_type == KeywordType::Project {
            None
        } else {
            uri
        };
        out.push(Keyword::new(value, keyword_type, uri));
    }
}

/// Relation type is the URI fragment (`…#memberOf` → `memberOf`).
fn relationship(entry: RelationshipEntry) -> Option<Relationship> {
    let target = non_blank(entry.target.as_deref())?;
    let relation = entry.relation.unwrap_or_default();
    let relation_type = relation
        .rsplit_once('#')
        .map_or(relation.as_str(), |(_, fragment)| fragment)
        .to_string();
    Some(Relationship {
        relation_type,
        target_dataset_id: target,
    })
}

fn online_resource(entry: LinkEntry) -> Option<OnlineResource> {
    Some(OnlineResource {
        url: non_blank(entry.url.as_deref())?,
        name: entry.name,
        description: entry.description,
        function: entry.function,
        resource_type: entry.resource_type,
    })
}

fn additional_metadata<const N: usize>(
    entries: [(&str, Option<Value>); N],
) -> Option<Map<String, Value>> {
    let map: Map<String, Value> = entries
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect();
    (!map.is_empty()).then_some(map)
}
