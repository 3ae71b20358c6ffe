//! Merges up to four per-format records into one canonical [`Dataset`].
//!
//! Each scalar field takes the first non-empty value along a fixed
//! precedence chain. Collections are taken wholesale from the first source
//! that has any entries. The winning source for every field is recorded in a
//! [`FieldProvenance`] so callers can audit the merge.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::extract::ExtractedSources;
use crate::model::{Dataset, Keyword, RawDocument, SourceFormat};

/// Reconciliation could not produce a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// None of the four formats produced a record.
    #[error("no source produced a record for {file_identifier}")]
    NoSources { file_identifier: String },

    /// Every source left the title empty.
    #[error("no source provided a title for {file_identifier}")]
    MissingTitle { file_identifier: String },
}

/// Which format supplied each reconciled field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldProvenance(BTreeMap<&'static str, SourceFormat>);

impl FieldProvenance {
    /// Returns the format that supplied `field`, if any did.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<SourceFormat> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, SourceFormat)> + '_ {
        self.0.iter().map(|(field, format)| (*field, *format))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Takes the first present candidate and records its format.
    fn first<T, const N: usize>(
        &mut self,
        field: &'static str,
        candidates: [(SourceFormat, Option<T>); N],
    ) -> Option<T> {
        let (format, value) = candidates
            .into_iter()
            .find_map(|(format, value)| value.map(|v| (format, v)))?;
        self.0.insert(field, format);
        Some(value)
    }

    /// Takes the first non-empty collection and records its format.
    fn first_non_empty<T, const N: usize>(
        &mut self,
        field: &'static str,
        candidates: [(SourceFormat, Option<&Vec<T>>); N],
    ) -> Vec<T>
    where
        T: Clone,
    {
        self.first(
            field,
            candidates.map(|(format, list)| (format, list.filter(|l| !l.is_empty()).cloned())),
        )
        .unwrap_or_default()
    }
}

/// A canonical dataset plus the provenance of its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub dataset: Dataset,
    pub provenance: FieldProvenance,
}

/// Builds the canonical record for `requested_id` from whatever sources exist.
///
/// # Errors
///
/// Returns [`ReconcileError::NoSources`] when every format is absent and
/// [`ReconcileError::MissingTitle`] when no source supplies a title.
pub fn reconcile(
    requested_id: &str,
    sources: &ExtractedSources,
) -> Result<Reconciled, ReconcileError> {
    use SourceFormat::{Json, JsonLd, Rdf, Xml};

    if sources.is_empty() {
        return Err(ReconcileError::NoSources {
            file_identifier: requested_id.to_string(),
        });
    }

    let xml = sources.xml.as_ref();
    let json = sources.json.as_ref();
    let jsonld = sources.jsonld.as_ref();
    let rdf = sources.rdf.as_ref();
    let mut prov = FieldProvenance::default();

    let file_identifier = prov
        .first(
            "file_identifier",
            [
                (Json, json.and_then(|r| non_empty(r.file_identifier.as_ref()))),
                (Xml, xml.and_then(|r| non_empty(r.file_identifier.as_ref()))),
            ],
        )
        .unwrap_or_else(|| requested_id.trim().to_string());

    let title = prov
        .first(
            "title",
            [
                (Json, json.and_then(|r| non_empty(r.title.as_ref()))),
                (JsonLd, jsonld.and_then(|r| non_empty(r.title.as_ref()))),
                (Xml, xml.and_then(|r| non_empty(r.title.as_ref()))),
                (Rdf, rdf.and_then(|r| non_empty(r.title.as_ref()))),
            ],
        )
        .ok_or_else(|| ReconcileError::MissingTitle {
            file_identifier: file_identifier.clone(),
        })?;

    let mut keywords = prov.first_non_empty(
        "keywords",
        [(Json, json.map(|r| &r.keywords)), (Xml, xml.map(|r| &r.keywords))],
    );
    if jsonld.is_some_and(|record| apply_term_sets(&mut keywords, record)) {
        prov.0.insert("in_defined_term_set", JsonLd);
    }

    let dataset = Dataset {
        id: None,
        abstract_text: prov.first(
            "abstract",
            [
                (Json, json.and_then(|r| r.description.clone())),
                (JsonLd, jsonld.and_then(|r| r.abstract_text.clone())),
                (Xml, xml.and_then(|r| r.abstract_text.clone())),
                (Rdf, rdf.and_then(|r| r.abstract_text.clone())),
            ],
        ),
        description: prov.first("description", [(Json, json.and_then(|r| r.description.clone()))]),
        lineage: prov.first(
            "lineage",
            [
                (Json, json.and_then(|r| r.lineage.clone())),
                (Xml, xml.and_then(|r| r.lineage.clone())),
            ],
        ),
        publication_date: prov.first(
            "publication_date",
            [
                (Json, json.and_then(|r| r.publication_date)),
                (Xml, xml.and_then(|r| r.publication_date)),
                (JsonLd, jsonld.and_then(|r| r.date_published)),
            ],
        ),
        metadata_date: prov.first(
            "metadata_date",
            [
                (Json, json.and_then(|r| r.metadata_date)),
                (Xml, xml.and_then(|r| r.metadata_date)),
            ],
        ),
        updated_date: prov.first("updated_date", [(Json, json.and_then(|r| r.updated_date))]),
        metadata_standard: prov.first(
            "metadata_standard",
            [(Xml, xml.and_then(|r| r.metadata_standard.clone()))],
        ),
        metadata_standard_version: prov.first(
            "metadata_standard_version",
            [(Xml, xml.and_then(|r| r.metadata_standard_version.clone()))],
        ),
        language: prov.first(
            "language",
            [
                (Xml, xml.and_then(|r| r.language.clone())),
                (Rdf, rdf.and_then(|r| r.language_uri.clone())),
            ],
        ),
        resource_status: prov.first(
            "resource_status",
            [(Json, json.and_then(|r| r.resource_status.clone()))],
        ),
        resource_type: prov.first(
            "resource_type",
            [
                (Json, json.and_then(|r| r.resource_type.clone())),
                (Xml, xml.and_then(|r| r.resource_type.clone())),
            ],
        ),
        spatial_extent: prov.first(
            "spatial_extent",
            [
                (Json, json.and_then(|r| r.spatial_extent)),
                (Xml, xml.and_then(|r| r.spatial_extent)),
                (JsonLd, jsonld.and_then(|r| r.spatial_extent)),
            ],
        ),
        temporal_extent: prov.first(
            "temporal_extent",
            [
                (Json, json.and_then(|r| r.temporal_extent)),
                (Xml, xml.and_then(|r| r.temporal_extent)),
                (JsonLd, jsonld.and_then(|r| r.temporal_extent)),
            ],
        ),
        credit_text: prov.first(
            "credit_text",
            [
                (JsonLd, jsonld.and_then(|r| r.credit_text.clone())),
                (Rdf, rdf.and_then(|r| r.bibliographic_citation.clone())),
            ],
        ),
        is_accessible_for_free: prov.first(
            "is_accessible_for_free",
            [(JsonLd, jsonld.and_then(|r| r.is_accessible_for_free))],
        ),
        additional_metadata: prov.first(
            "additional_metadata",
            [(Json, json.and_then(|r| r.additional_metadata.clone()))],
        ),
        contacts: prov.first_non_empty(
            "contacts",
            [(Json, json.map(|r| &r.contacts)), (Xml, xml.map(|r| &r.contacts))],
        ),
        keywords,
        relationships: prov.first_non_empty("relationships", [(Json, json.map(|r| &r.relationships))]),
        online_resources: prov.first_non_empty(
            "online_resources",
            [(Json, json.map(|r| &r.online_resources))],
        ),
        raw_documents: raw_documents(sources),
        purpose: xml.and_then(|r| r.purpose.clone()),
        creation_date: xml.and_then(|r| r.creation_date),
        file_identifier,
        title,
        created_at: None,
        updated_at: None,
    };

    debug!(
        file_identifier = %dataset.file_identifier,
        fields = prov.len(),
        provenance = ?prov,
        "reconciled dataset"
    );

    Ok(Reconciled {
        dataset,
        provenance: prov,
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Attaches JSON-LD term sets to keywords with identical text.
/// Returns whether any keyword was changed.
fn apply_term_sets(keywords: &mut [Keyword], jsonld: &crate::extract::JsonLdRecord) -> bool {
    let term_sets: HashMap<&str, &str> = jsonld
        .keywords_with_term_sets
        .iter()
        .map(|t| (t.keyword.as_str(), t.in_defined_term_set.as_str()))
        .collect();

    let mut changed = false;
    for keyword in keywords {
        if let Some(set) = term_sets.get(keyword.keyword.as_str()) {
            keyword.in_defined_term_set = Some((*set).to_string());
            changed = true;
        }
    }
    changed
}

/// One raw document per extracted format, in xml, json, jsonld, rdf order.
fn raw_documents(sources: &ExtractedSources) -> Vec<RawDocument> {
    [
        sources.xml.as_ref().and_then(|r| r.raw.clone()),
        sources.json.as_ref().and_then(|r| r.raw.clone()),
        sources.jsonld.as_ref().and_then(|r| r.raw.clone()),
        sources.rdf.as_ref().and_then(|r| r.raw.clone()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extract::{JsonLdRecord, JsonRecord, RdfRecord, TermSetKeyword, XmlRecord};
    use crate::model::{Contact, KeywordType, SpatialExtent, TemporalExtent};
    use chrono::NaiveDate;

    fn at() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn json(id: &str, title: &str) -> JsonRecord {
        JsonRecord {
            file_identifier: Some(id.to_string()),
            title: Some(title.to_string()),
            raw: Some(RawDocument::new(SourceFormat::Json, "{}".into(), at())),
            ..JsonRecord::default()
        }
    }

    fn xml(id: &str, title: &str) -> XmlRecord {
        XmlRecord {
            file_identifier: Some(id.to_string()),
            title: Some(title.to_string()),
            raw: Some(RawDocument::new(SourceFormat::Xml, "<x/>".into(), at())),
            ..XmlRecord::default()
        }
    }

    fn extent(w: f64, e: f64, s: f64, n: f64) -> SpatialExtent {
        SpatialExtent {
            west: w,
            east: e,
            south: s,
            north: n,
        }
    }

    // ==================== Presence ====================

    #[test]
    fn test_no_sources_fails() {
        let err = reconcile("eidc-404", &ExtractedSources::default()).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::NoSources {
                file_identifier: "eidc-404".into()
            }
        );
    }

    #[test]
    fn test_single_json_source_succeeds() {
        let sources = ExtractedSources {
            json: Some(JsonRecord {
                spatial_extent: Some(extent(-5.0, 2.0, 50.0, 55.0)),
                ..json("eidc-001", "Soil Carbon 2020")
            }),
            ..ExtractedSources::default()
        };
        let Reconciled {
            dataset,
            provenance,
        } = reconcile("eidc-001", &sources).unwrap();

        assert_eq!(dataset.file_identifier, "eidc-001");
        assert_eq!(dataset.title, "Soil Carbon 2020");
        assert_eq!(dataset.spatial_extent, Some(extent(-5.0, 2.0, 50.0, 55.0)));
        assert_eq!(dataset.source_formats(), vec![SourceFormat::Json]);
        assert_eq!(provenance.source_of("title"), Some(SourceFormat::Json));
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn test_single_rdf_source_uses_requested_identifier() {
        let sources = ExtractedSources {
            rdf: Some(RdfRecord {
                file_identifier: Some("eidc-002".into()),
                title: Some("From RDF".into()),
                language_uri: Some("http://lang/ENG".into()),
                bibliographic_citation: Some("Cite me".into()),
                ..RdfRecord::default()
            }),
            ..ExtractedSources::default()
        };
        let dataset = reconcile("eidc-002", &sources).unwrap().dataset;
        assert_eq!(dataset.file_identifier, "eidc-002");
        assert_eq!(dataset.title, "From RDF");
        assert_eq!(dataset.language.as_deref(), Some("http://lang/ENG"));
        assert_eq!(dataset.credit_text.as_deref(), Some("Cite me"));
    }

    #[test]
    fn test_blank_titles_everywhere_fail() {
        let sources = ExtractedSources {
            json: Some(json("eidc-003", "  ")),
            ..ExtractedSources::default()
        };
        assert!(matches!(
            reconcile("eidc-003", &sources),
            Err(ReconcileError::MissingTitle { .. })
        ));
    }

    // ==================== Precedence ====================

    #[test]
    fn test_json_title_beats_xml() {
        let sources = ExtractedSources {
            json: Some(json("eidc-001", "A")),
            xml: Some(xml("eidc-001", "B")),
            ..ExtractedSources::default()
        };
        let reconciled = reconcile("eidc-001", &sources).unwrap();
        assert_eq!(reconciled.dataset.title, "A");
    }

    #[test]
    fn test_jsonld_title_beats_xml_when_json_absent() {
        let sources = ExtractedSources {
            xml: Some(xml("eidc-001", "B")),
            jsonld: Some(JsonLdRecord {
                title: Some("C".into()),
                ..JsonLdRecord::default()
            }),
            ..ExtractedSources::default()
        };
        let reconciled = reconcile("eidc-001", &sources).unwrap();
        assert_eq!(reconciled.dataset.title, "C");
        assert_eq!(
            reconciled.provenance.source_of("file_identifier"),
            Some(SourceFormat::Xml)
        );
    }

    #[test]
    fn test_scalar_fallbacks() {
        let publication = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let sources = ExtractedSources {
            xml: Some(XmlRecord {
                lineage: Some("XML lineage".into()),
                language: Some("eng".into()),
                metadata_standard: Some("ISO 19115".into()),
                resource_type: Some("dataset".into()),
                purpose: Some("Legacy purpose".into()),
                ..xml("eidc-001", "B")
            }),
            jsonld: Some(JsonLdRecord {
                date_published: Some(publication),
                credit_text: Some("JSON-LD citation".into()),
                is_accessible_for_free: Some(true),
                ..JsonLdRecord::default()
            }),
            rdf: Some(RdfRecord {
                bibliographic_citation: Some("RDF citation".into()),
                language_uri: Some("http://lang/ENG".into()),
                ..RdfRecord::default()
            }),
            ..ExtractedSources::default()
        };
        let dataset = reconcile("eidc-001", &sources).unwrap().dataset;
        assert_eq!(dataset.lineage.as_deref(), Some("XML lineage"));
        assert_eq!(dataset.language.as_deref(), Some("eng"));
        assert_eq!(dataset.metadata_standard.as_deref(), Some("ISO 19115"));
        assert_eq!(dataset.resource_type.as_deref(), Some("dataset"));
        assert_eq!(dataset.publication_date, Some(publication));
        assert_eq!(dataset.credit_text.as_deref(), Some("JSON-LD citation"));
        assert_eq!(dataset.is_accessible_for_free, Some(true));
        assert_eq!(dataset.purpose.as_deref(), Some("Legacy purpose"));
        assert!(dataset.description.is_none());
    }

    #[test]
    fn test_json_description_fills_abstract_and_description() {
        let sources = ExtractedSources {
            json: Some(JsonRecord {
                description: Some("Carbon stocks".into()),
                ..json("eidc-001", "A")
            }),
            xml: Some(XmlRecord {
                abstract_text: Some("XML abstract".into()),
                ..xml("eidc-001", "B")
            }),
            ..ExtractedSources::default()
        };
        let dataset = reconcile("eidc-001", &sources).unwrap().dataset;
        assert_eq!(dataset.abstract_text.as_deref(), Some("Carbon stocks"));
        assert_eq!(dataset.description.as_deref(), Some("Carbon stocks"));
    }

    // ==================== Extents ====================

    #[test]
    fn test_incomplete_bounds_give_no_extent() {
        let doc = serde_json::json!({
            "id": "eidc-001",
            "title": "A",
            "boundingBoxes": [{"westBoundLongitude": -5, "eastBoundLongitude": 2, "southBoundLatitude": 50}]
        });
        let record = crate::extract::json::parse(&doc.to_string()).unwrap();
        let sources = ExtractedSources {
            json: Some(record),
            ..ExtractedSources::default()
        };
        assert!(reconcile("eidc-001", &sources).unwrap().dataset.spatial_extent.is_none());
    }

    #[test]
    fn test_extent_falls_back_wholesale() {
        let temporal = TemporalExtent::new(NaiveDate::from_ymd_opt(2000, 1, 1), None);
        let sources = ExtractedSources {
            json: Some(json("eidc-001", "A")),
            xml: Some(XmlRecord {
                temporal_extent: temporal,
                ..xml("eidc-001", "B")
            }),
            jsonld: Some(JsonLdRecord {
                spatial_extent: Some(extent(1.0, 2.0, 3.0, 4.0)),
                temporal_extent: TemporalExtent::new(None, NaiveDate::from_ymd_opt(2020, 1, 1)),
                ..JsonLdRecord::default()
            }),
            rdf: Some(RdfRecord {
                spatial_wkt: Some("POLYGON((9 9, 9 9, 9 9, 9 9, 9 9))".into()),
                ..RdfRecord::default()
            }),
        };
        let Reconciled {
            dataset,
            provenance,
        } = reconcile("eidc-001", &sources).unwrap();
        assert_eq!(dataset.spatial_extent, Some(extent(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(dataset.temporal_extent, temporal);
        assert_eq!(
            provenance.source_of("spatial_extent"),
            Some(SourceFormat::JsonLd)
        );
        assert_eq!(
            provenance.source_of("temporal_extent"),
            Some(SourceFormat::Xml)
        );
    }

    // ==================== Collections ====================

    #[test]
    fn test_collections_prefer_non_empty_json() {
        let xml_contact = Contact {
            role: "pointOfContact".into(),
            full_name: Some("XML Person".into()),
            ..Contact::default()
        };
        let sources = ExtractedSources {
            json: Some(json("eidc-001", "A")),
            xml: Some(XmlRecord {
                contacts: vec![xml_contact.clone()],
                keywords: vec![Keyword::new("soil", KeywordType::Theme, None)],
                ..xml("eidc-001", "B")
            }),
            ..ExtractedSources::default()
        };
        let Reconciled {
            dataset,
            provenance,
        } = reconcile("eidc-001", &sources).unwrap();
        assert_eq!(dataset.contacts, vec![xml_contact]);
        assert_eq!(dataset.keywords.len(), 1);
        assert_eq!(provenance.source_of("contacts"), Some(SourceFormat::Xml));
        assert!(dataset.relationships.is_empty());
        assert_eq!(provenance.source_of("relationships"), None);
    }

    #[test]
    fn test_term_sets_attach_on_exact_match_only() {
        let sources = ExtractedSources {
            json: Some(JsonRecord {
                keywords: vec![
                    Keyword::new("Soil", KeywordType::Theme, None),
                    Keyword::new("soil carbon", KeywordType::Theme, None),
                ],
                ..json("eidc-001", "A")
            }),
            jsonld: Some(JsonLdRecord {
                keywords_with_term_sets: vec![TermSetKeyword {
                    keyword: "Soil".into(),
                    in_defined_term_set: "http://vocab/gemet".into(),
                }],
                ..JsonLdRecord::default()
            }),
            ..ExtractedSources::default()
        };
        let Reconciled {
            dataset,
            provenance,
        } = reconcile("eidc-001", &sources).unwrap();
        assert_eq!(
            dataset.keywords[0].in_defined_term_set.as_deref(),
            Some("http://vocab/gemet")
        );
        assert!(dataset.keywords[1].in_defined_term_set.is_none());
        assert_eq!(
            provenance.source_of("in_defined_term_set"),
            Some(SourceFormat::JsonLd)
        );
    }

    #[test]
    fn test_raw_documents_in_format_order() {
        let sources = ExtractedSources {
            json: Some(json("eidc-001", "A")),
            xml: Some(xml("eidc-001", "B")),
            jsonld: Some(JsonLdRecord {
                title: Some("C".into()),
                raw: Some(RawDocument::new(SourceFormat::JsonLd, "{}".into(), at())),
                ..JsonLdRecord::default()
            }),
            ..ExtractedSources::default()
        };
        let dataset = reconcile("eidc-001", &sources).unwrap().dataset;
        assert_eq!(
            dataset.source_formats(),
            vec![SourceFormat::Xml, SourceFormat::Json, SourceFormat::JsonLd]
        );
    }
}
