//! Schema.org JSON-LD extractor.
//!
//! The catalog publishes a flattened `@graph`; the dataset node links to its
//! place, shape and defined terms by `@id`. Every indirection is followed
//! leniently: a broken link yields `None` rather than an error.

use chrono::NaiveDate;
use serde_json::Value;

use super::dates::{parse_date, parse_temporal_extent};
use crate::model::{RawDocument, SpatialExtent, TemporalExtent};

const DATASET_TYPE: &str = "Dataset";
const DEFINED_TERM_TYPE: &str = "DefinedTerm";

/// Keyword text paired with the defined term set it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSetKeyword {
    pub keyword: String,
    pub in_defined_term_set: String,
}

/// Fields read from a Schema.org JSON-LD document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonLdRecord {
    pub file_identifier: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub credit_text: Option<String>,
    pub is_accessible_for_free: Option<bool>,
    pub date_published: Option<NaiveDate>,
    pub creator_ids: Vec<String>,
    pub license: Option<String>,
    pub publisher_id: Option<String>,
    pub spatial_extent: Option<SpatialExtent>,
    pub temporal_extent: Option<TemporalExtent>,
    pub keywords_with_term_sets: Vec<TermSetKeyword>,
    pub raw: Option<RawDocument>,
}

/// Parses a JSON-LD document and reads its `Dataset` node.
///
/// # Errors
///
/// Returns an error for invalid JSON or when no `Dataset` node exists.
pub fn parse(text: &str) -> Result<JsonLdRecord, String> {
    let doc: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let graph = Graph::new(&doc);
    let dataset = graph
        .nodes
        .iter()
        .copied()
        .find(|node| has_type(node, DATASET_TYPE))
        .ok_or_else(|| "no Dataset node in JSON-LD document".to_string())?;

    Ok(JsonLdRecord {
        file_identifier: str_field(dataset, "@id").as_deref().and_then(last_segment),
        title: str_field(dataset, "name"),
        abstract_text: str_field(dataset, "description"),
        credit_text: str_field(dataset, "creditText"),
        is_accessible_for_free: dataset.get("isAccessibleForFree").and_then(Value::as_bool),
        date_published: str_field(dataset, "datePublished")
            .as_deref()
            .and_then(parse_date),
        creator_ids: as_list(dataset.get("creator"))
            .filter_map(|c| c.get("@id").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        license: license(dataset.get("license")),
        publisher_id: dataset
            .get("publisher")
            .and_then(|p| p.get("@id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        spatial_extent: spatial_extent(&graph, dataset),
        temporal_extent: temporal_extent(dataset.get("temporalCoverage")),
        keywords_with_term_sets: term_set_keywords(&graph, dataset),
        raw: None,
    })
}

/// Node lookup over `@graph`, or over the document itself when it has none.
struct Graph<'a> {
    nodes: Vec<&'a Value>,
}

impl<'a> Graph<'a> {
    fn new(doc: &'a Value) -> Self {
        let nodes = match doc.get("@graph") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            _ => vec![doc],
        };
        Self { nodes }
    }

    fn by_id(&self, id: &str) -> Option<&'a Value> {
        self.nodes
            .iter()
            .copied()
            .find(|n| n.get("@id").and_then(Value::as_str) == Some(id))
    }

    /// Follows an `{"@id": …}` reference; inline nodes are returned as-is.
    fn resolve(&self, value: &'a Value) -> Option<&'a Value> {
        let id = value.get("@id").and_then(Value::as_str);
        match id {
            Some(id) if value.as_object().is_some_and(|o| o.len() == 1) => self.by_id(id),
            _ if value.is_object() => Some(value),
            _ => value.as_str().and_then(|id| self.by_id(id)),
        }
    }
}

fn has_type(node: &Value, wanted: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

fn str_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Iterates a property that may be a single value or an array.
fn as_list(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    let items: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    };
    items.into_iter()
}

fn last_segment(id: &str) -> Option<String> {
    id.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn license(value: Option<&Value>) -> Option<String> {
    let first = as_list(value).next()?;
    first
        .as_str()
        .or_else(|| first.get("@id").and_then(Value::as_str))
        .or_else(|| first.get("url").and_then(Value::as_str))
        .map(str::to_string)
}

/// `spatialCoverage[0]` → Place → `geo` → GeoShape `box` "west south, east north".
fn spatial_extent(graph: &Graph<'_>, dataset: &Value) -> Option<SpatialExtent> {
    let place = graph.resolve(as_list(dataset.get("spatialCoverage")).next()?)?;
    let shape = graph.resolve(place.get("geo")?)?;
    parse_box(shape.get("box")?.as_str()?)
}

fn parse_box(text: &str) -> Option<SpatialExtent> {
    let (west_south, east_north) = text.split_once(',')?;
    let mut ws = west_south.split_whitespace().map(str::parse::<f64>);
    let mut en = east_north.split_whitespace().map(str::parse::<f64>);
    let west = ws.next()?.ok();
    let south = ws.next()?.ok();
    let east = en.next()?.ok();
    let north = en.next()?.ok();
    SpatialExtent::from_bounds(west, east, south, north)
}

/// `temporalCoverage` as "start/end", string or first array element.
fn temporal_extent(value: Option<&Value>) -> Option<TemporalExtent> {
    let coverage = as_list(value).next()?.as_str()?;
    let (start, end) = coverage.split_once('/')?;
    let start = Some(start.trim()).filter(|s| !s.is_empty() && *s != "..");
    let end = Some(end.trim()).filter(|s| !s.is_empty() && *s != "..");
    parse_temporal_extent(start, end)
}

/// Collects `DefinedTerm` keywords that name their term set.
fn term_set_keywords(graph: &Graph<'_>, dataset: &Value) -> Vec<TermSetKeyword> {
    as_list(dataset.get("keywords"))
        .filter_map(|entry| graph.resolve(entry))
        .filter(|term| has_type(term, DEFINED_TERM_TYPE))
        .filter_map(|term| {
            let keyword = str_field(term, "name")?;
            let set = term.get("inDefinedTermSet")?;
            let in_defined_term_set = set
                .as_str()
                .or_else(|| set.get("@id").and_then(Value::as_str))
                .or_else(|| set.get("url").and_then(Value::as_str))?
                .to_string();
            Some(TermSetKeyword {
                keyword,
                in_defined_term_set,
            })
        })
        .collect()
}
