//! Catalog fixtures and mock-server helpers shared by the integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The four published formats, as served by the mock catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Xml,
    Json,
    JsonLd,
    Turtle,
}

pub const ALL_FORMATS: [Served; 4] = [Served::Xml, Served::Json, Served::JsonLd, Served::Turtle];

const XML_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
    xmlns:gco="http://www.isotc211.org/2005/gco"
    xmlns:gml="http://www.opengis.net/gml/3.2">
  <gmd:fileIdentifier><gco:CharacterString>{id}</gco:CharacterString></gmd:fileIdentifier>
  <gmd:language><gmd:LanguageCode codeList="x" codeListValue="eng">English</gmd:LanguageCode></gmd:language>
  <gmd:hierarchyLevel><gmd:MD_ScopeCode codeList="x" codeListValue="dataset"/></gmd:hierarchyLevel>
  <gmd:dateStamp><gco:DateTime>2023-04-05T10:11:12</gco:DateTime></gmd:dateStamp>
  <gmd:metadataStandardName><gco:CharacterString>UK GEMINI</gco:CharacterString></gmd:metadataStandardName>
  <gmd:metadataStandardVersion><gco:CharacterString>2.3</gco:CharacterString></gmd:metadataStandardVersion>
  <gmd:identificationInfo>
    <gmd:MD_DataIdentification>
      <gmd:citation><gmd:CI_Citation>
        <gmd:title><gco:CharacterString>Soil carbon (XML)</gco:CharacterString></gmd:title>
      </gmd:CI_Citation></gmd:citation>
      <gmd:abstract><gco:CharacterString>Abstract from XML</gco:CharacterString></gmd:abstract>
      <gmd:extent><gmd:EX_Extent>
        <gmd:geographicElement><gmd:EX_GeographicBoundingBox>
          <gmd:westBoundLongitude><gco:Decimal>-6</gco:Decimal></gmd:westBoundLongitude>
          <gmd:eastBoundLongitude><gco:Decimal>1</gco:Decimal></gmd:eastBoundLongitude>
          <gmd:southBoundLatitude><gco:Decimal>49</gco:Decimal></gmd:southBoundLatitude>
          <gmd:northBoundLatitude><gco:Decimal>56</gco:Decimal></gmd:northBoundLatitude>
        </gmd:EX_GeographicBoundingBox></gmd:geographicElement>
      </gmd:EX_Extent></gmd:extent>
    </gmd:MD_DataIdentification>
  </gmd:identificationInfo>
</gmd:MD_Metadata>"#;

const JSON_DOC: &str = r#"{
  "id": "{id}",
  "title": "Soil carbon (JSON)",
  "description": "Abstract from JSON",
  "publicationDate": "2020-06-01",
  "boundingBoxes": [
    {"westBoundLongitude": -5, "eastBoundLongitude": 2,
     "southBoundLatitude": 50, "northBoundLatitude": 55}
  ],
  "responsibleParties": [
    {"role": "author", "fullName": "Doe, Jane", "email": "jane@example.org"}
  ],
  "keywordsTheme": [{"value": "soil", "uri": "http://vocab/soil"}]
}"#;

const JSONLD_DOC: &str = r##"{
  "@context": "https://schema.org/",
  "@graph": [
    {
      "@id": "https://catalogue.ceh.ac.uk/id/{id}",
      "@type": "Dataset",
      "name": "Soil carbon (JSON-LD)",
      "description": "Abstract from JSON-LD",
      "creditText": "Doe, J. (2020). Soil carbon. NERC EDS.",
      "isAccessibleForFree": true,
      "keywords": [{"@id": "#term-soil"}]
    },
    {"@id": "#term-soil", "@type": "DefinedTerm", "name": "soil",
     "inDefinedTermSet": {"@id": "http://vocab/agrovoc"}}
  ]
}"##;

const TURTLE_DOC: &str = r#"
@prefix dct: <http://purl.org/dc/terms/> .
@prefix dcat: <http://www.w3.org/ns/dcat#> .

<https://catalogue.ceh.ac.uk/id/{id}>
    a dcat:Dataset ;
    dct:title "Soil carbon (RDF)" ;
    dct:description "Abstract from RDF" ;
    dct:bibliographicCitation "Doe, J. (2020). Soil carbon (RDF citation)." .
"#;

/// Body the mock catalog serves for `format`, with `id` substituted.
#[must_use]
pub fn document(format: Served, id: &str) -> String {
    let template = match format {
        Served::Xml => XML_DOC,
        Served::Json => JSON_DOC,
        Served::JsonLd => JSONLD_DOC,
        Served::Turtle => TURTLE_DOC,
    };
    template.replace("{id}", id)
}

/// Serves `formats` of dataset `id`; anything else falls through to 404.
pub async fn mount_dataset(server: &MockServer, id: &str, formats: &[Served]) {
    for &format in formats {
        let body = document(format, id);
        let mock = match format {
            Served::Xml => Mock::given(method("GET")).and(path(format!("/documents/{id}.xml"))),
            Served::Json => Mock::given(method("GET"))
                .and(path(format!("/documents/{id}")))
                .and(query_param("format", "json")),
            Served::JsonLd => Mock::given(method("GET"))
                .and(path(format!("/documents/{id}")))
                .and(query_param("format", "schema.org")),
            Served::Turtle => Mock::given(method("GET"))
                .and(path(format!("/documents/{id}")))
                .and(query_param("format", "ttl")),
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }
}
