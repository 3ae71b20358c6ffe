//! DCAT RDF (Turtle) extractor.

use chrono::NaiveDate;
use oxrdf::{Subject, Term};
use oxttl::TurtleParser;

use super::dates::{parse_date, parse_temporal_extent};
use crate::model::{RawDocument, TemporalExtent};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const DCAT_DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
const DCAT_BBOX: &str = "http://www.w3.org/ns/dcat#bbox";
const DCAT_START_DATE: &str = "http://www.w3.org/ns/dcat#startDate";
const DCAT_END_DATE: &str = "http://www.w3.org/ns/dcat#endDate";
const DCAT_LANDING_PAGE: &str = "http://www.w3.org/ns/dcat#landingPage";

const DCT_TITLE: &str = "http://purl.org/dc/terms/title";
const DCT_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
const DCT_LANGUAGE: &str = "http://purl.org/dc/terms/language";
const DCT_BIBLIOGRAPHIC_CITATION: &str = "http://purl.org/dc/terms/bibliographicCitation";
const DCT_PROVENANCE: &str = "http://purl.org/dc/terms/provenance";
const DCT_AVAILABLE: &str = "http://purl.org/dc/terms/available";
const DCT_IS_PART_OF: &str = "http://purl.org/dc/terms/isPartOf";
const DCT_LICENSE: &str = "http://purl.org/dc/terms/license";
const DCT_ACCESS_RIGHTS: &str = "http://purl.org/dc/terms/accessRights";
const DCT_CREATOR: &str = "http://purl.org/dc/terms/creator";
const DCT_SPATIAL: &str = "http://purl.org/dc/terms/spatial";
const DCT_TEMPORAL: &str = "http://purl.org/dc/terms/temporal";

/// Fields read from a DCAT Turtle document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RdfRecord {
    pub file_identifier: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub language_uri: Option<String>,
    pub bibliographic_citation: Option<String>,
    pub provenance: Option<String>,
    pub date_available: Option<NaiveDate>,
    pub is_part_of: Vec<String>,
    pub license_uri: Option<String>,
    pub access_rights_uri: Option<String>,
    pub creator_uris: Vec<String>,
    /// `dcat:bbox` literal as published (WKT).
    pub spatial_wkt: Option<String>,
    pub temporal_extent: Option<TemporalExtent>,
    pub landing_pages: Vec<String>,
    pub raw: Option<RawDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Iri(String),
    Blank(String),
    Literal(String),
}

impl Node {
    fn iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            Self::Blank(_) | Self::Literal(_) => None,
        }
    }

    fn lexical(&self) -> &str {
        match self {
            Self::Iri(v) | Self::Blank(v) | Self::Literal(v) => v,
        }
    }
}

/// In-memory triple list; catalog documents hold a few hundred triples.
struct TripleStore {
    triples: Vec<(Node, String, Node)>,
}

impl TripleStore {
    fn parse(text: &str) -> Result<Self, String> {
        let mut triples = Vec::new();
        for triple in TurtleParser::new().for_reader(text.as_bytes()) {
            let triple = triple.map_err(|e| e.to_string())?;
            let subject = match triple.subject {
                Subject::NamedNode(n) => Node::Iri(n.into_string()),
                Subject::BlankNode(b) => Node::Blank(b.into_string()),
                #[allow(unreachable_patterns)]
                _ => continue,
            };
            let object = match triple.object {
                Term::NamedNode(n) => Node::Iri(n.into_string()),
                Term::BlankNode(b) => Node::Blank(b.into_string()),
                Term::Literal(l) => Node::Literal(l.value().to_string()),
                #[allow(unreachable_patterns)]
                _ => continue,
            };
            triples.push((subject, triple.predicate.into_string(), object));
        }
        Ok(Self { triples })
    }

    fn objects<'a>(&'a self, subject: &'a Node, predicate: &'a str) -> impl Iterator<Item = &'a Node> {
        self.triples
            .iter()
            .filter(move |(s, p, _)| s == subject && p == predicate)
            .map(|(_, _, o)| o)
    }

    fn first_value(&self, subject: &Node, predicate: &str) -> Option<String> {
        self.objects(subject, predicate)
            .map(|o| o.lexical().trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn first_iri(&self, subject: &Node, predicate: &str) -> Option<String> {
        self.objects(subject, predicate)
            .find_map(Node::iri)
            .map(str::to_string)
    }

    fn iris(&self, subject: &Node, predicate: &str) -> Vec<String> {
        self.objects(subject, predicate)
            .filter_map(Node::iri)
            .map(str::to_string)
            .collect()
    }
}

/// Parses Turtle and reads the first `dcat:Dataset` subject.
///
/// # Errors
///
/// Returns an error for Turtle syntax errors or when no dataset is typed.
pub fn parse(text: &str) -> Result<RdfRecord, String> {
    let store = TripleStore::parse(text)?;
    let dataset = store
        .triples
        .iter()
        .find(|(_, p, o)| p == RDF_TYPE && o.iri() == Some(DCAT_DATASET))
        .map(|(s, _, _)| s.clone())
        .ok_or_else(|| "no dcat:Dataset in RDF document".to_string())?;

    let provenance = store
        .objects(&dataset, DCT_PROVENANCE)
        .find_map(|node| store.first_value(node, RDFS_LABEL));

    let spatial_wkt = store
        .objects(&dataset, DCT_SPATIAL)
        .find_map(|node| store.first_value(node, DCAT_BBOX));

    let temporal_extent = store
        .objects(&dataset, DCT_TEMPORAL)
        .find_map(|node| {
            let start = store.first_value(node, DCAT_START_DATE);
            let end = store.first_value(node, DCAT_END_DATE);
            parse_temporal_extent(start.as_deref(), end.as_deref())
        });

    Ok(RdfRecord {
        file_identifier: dataset.iri().and_then(|iri| {
            iri.trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        title: store.first_value(&dataset, DCT_TITLE),
        abstract_text: store.first_value(&dataset, DCT_DESCRIPTION),
        language_uri: store.first_iri(&dataset, DCT_LANGUAGE),
        bibliographic_citation: store.first_value(&dataset, DCT_BIBLIOGRAPHIC_CITATION),
        provenance,
        date_available: store
            .first_value(&dataset, DCT_AVAILABLE)
            .as_deref()
            .and_then(parse_date),
        is_part_of: store.iris(&dataset, DCT_IS_PART_OF),
        license_uri: store.first_iri(&dataset, DCT_LICENSE),
        access_rights_uri: store.first_iri(&dataset, DCT_ACCESS_RIGHTS),
        creator_uris: store.iris(&dataset, DCT_CREATOR),
        spatial_wkt,
        temporal_extent,
        landing_pages: store.iris(&dataset, DCAT_LANDING_PAGE),
        raw: None,
    })
}
