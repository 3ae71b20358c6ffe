//! ISO-19115 (gmd) XML extractor.

use chrono::{NaiveDate, NaiveDateTime};

use super::dates::{parse_date, parse_datetime, parse_temporal_extent};
use super::xml_tree::{self, Element, QName};
use crate::model::{
    Contact, Keyword, KeywordType, OnlineResource, RawDocument, SpatialExtent, TemporalExtent,
};

const GMD: &str = "http://www.isotc211.org/2005/gmd";
const GCO: &str = "http://www.isotc211.org/2005/gco";
const GML: &str = "http://www.opengis.net/gml/3.2";
const GMX: &str = "http://www.isotc211.org/2005/gmx";
const XLINK: &str = "http://www.w3.org/1999/xlink";

const CHARACTER_STRING: QName = (GCO, "CharacterString");
const ANCHOR: QName = (GMX, "Anchor");
const DECIMAL: QName = (GCO, "Decimal");

/// Resource type assigned to every XML distribution link.
const XML_ONLINE_RESOURCE_TYPE: &str = "OTHER";

const fn gmd(name: &'static str) -> QName {
    (GMD, name)
}

/// Fields read from an ISO-19115 document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlRecord {
    pub file_identifier: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub purpose: Option<String>,
    pub lineage: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub publication_date: Option<NaiveDate>,
    pub metadata_date: Option<NaiveDateTime>,
    pub metadata_standard: Option<String>,
    pub metadata_standard_version: Option<String>,
    pub language: Option<String>,
    pub resource_type: Option<String>,
    pub contacts: Vec<Contact>,
    pub keywords: Vec<Keyword>,
    pub online_resources: Vec<OnlineResource>,
    pub spatial_extent: Option<SpatialExtent>,
    pub temporal_extent: Option<TemporalExtent>,
    pub raw: Option<RawDocument>,
}

/// Parses an ISO-19115 document. Missing optional elements become `None`.
///
/// # Errors
///
/// Returns a description of the XML syntax error for malformed input.
pub fn parse(text: &str) -> Result<XmlRecord, String> {
    let root = xml_tree::parse(text)?;
    let ident = root.child(gmd("identificationInfo"));
    let citation = ident
        .and_then(|i| i.descendant(gmd("citation")))
        .and_then(|c| c.descendant(gmd("CI_Citation")));

    let (creation_date, publication_date) = citation.map_or((None, None), citation_dates);

    Ok(XmlRecord {
        file_identifier: root
            .path(&[gmd("fileIdentifier"), CHARACTER_STRING])
            .and_then(text_of)
            .map(str::to_string),
        title: citation
            .and_then(|c| c.child(gmd("title")))
            .and_then(string_value),
        abstract_text: ident
            .and_then(|i| i.descendant(gmd("abstract")))
            .and_then(string_value),
        purpose: ident
            .and_then(|i| i.descendant(gmd("purpose")))
            .and_then(string_value),
        lineage: root
            .descendant(gmd("lineage"))
            .and_then(|l| l.descendant(gmd("statement")))
            .and_then(string_value),
        creation_date,
        publication_date,
        metadata_date: root.child(gmd("dateStamp")).and_then(date_stamp),
        metadata_standard: root
            .child(gmd("metadataStandardName"))
            .and_then(string_value),
        metadata_standard_version: root
            .child(gmd("metadataStandardVersion"))
            .and_then(string_value),
        language: root.child(gmd("language")).and_then(language_value),
        resource_type: root
            .path(&[gmd("hierarchyLevel"), gmd("MD_ScopeCode")])
            .and_then(code_list_value),
        contacts: contacts(&root, ident),
        keywords: ident.map(keywords).unwrap_or_default(),
        online_resources: online_resources(&root),
        spatial_extent: spatial_extent(&root),
        temporal_extent: root.descendant((GML, "TimePeriod")).and_then(|period| {
            parse_temporal_extent(
                period.child((GML, "beginPosition")).and_then(text_of),
                period.child((GML, "endPosition")).and_then(text_of),
            )
        }),
        raw: None,
    })
}

fn text_of(element: &Element) -> Option<&str> {
    element.text()
}

/// Text of a `gco:CharacterString` or `gmx:Anchor` child.
fn string_value(element: &Element) -> Option<String> {
    element
        .child(CHARACTER_STRING)
        .or_else(|| element.child(ANCHOR))
        .and_then(Element::text)
        .map(str::to_string)
}

/// Text and `xlink:href` of a CharacterString or Anchor child.
fn anchored_value(element: &Element) -> Option<(String, Option<String>)> {
    if let Some(text) = element.child(CHARACTER_STRING).and_then(Element::text) {
        return Some((text.to_string(), None));
    }
    let anchor = element.child(ANCHOR)?;
    let href = anchor.attr(Some(XLINK), "href").map(str::to_string);
    anchor.text().map(|t| (t.to_string(), href))
}

fn code_list_value(element: &Element) -> Option<String> {
    element
        .attr(None, "codeListValue")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| element.text())
        .map(str::to_string)
}

fn language_value(element: &Element) -> Option<String> {
    string_value(element).or_else(|| {
        element
            .child(gmd("LanguageCode"))
            .and_then(code_list_value)
    })
}

fn date_stamp(element: &Element) -> Option<NaiveDateTime> {
    element
        .child((GCO, "DateTime"))
        .or_else(|| element.child((GCO, "Date")))
        .and_then(Element::text)
        .and_then(parse_datetime)
}

fn citation_dates(citation: &Element) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let mut creation = None;
    let mut publication = None;
    for ci_date in citation.descendants(gmd("CI_Date")) {
        let date = ci_date
            .child(gmd("date"))
            .and_then(|d| d.child((GCO, "Date")).or_else(|| d.child((GCO, "DateTime"))))
            .and_then(Element::text)
            .and_then(parse_date);
        let kind = ci_date
            .path(&[gmd("dateType"), gmd("CI_DateTypeCode")])
            .and_then(code_list_value);
        match kind.as_deref() {
            Some("creation") if creation.is_none() => creation = date,
            Some("publication") if publication.is_none() => publication = date,
            _ => {}
        }
    }
    (creation, publication)
}

fn contacts(root: &Element, ident: Option<&Element>) -> Vec<Contact> {
    let mut parties: Vec<&Element> = root
        .children(gmd("contact"))
        .flat_map(|c| c.descendants(gmd("CI_ResponsibleParty")))
        .collect();
    if let Some(ident) = ident {
        parties.extend(
            ident
                .descendants(gmd("pointOfContact"))
                .into_iter()
                .flat_map(|p| p.descendants(gmd("CI_ResponsibleParty"))),
        );
    }
    parties.into_iter().filter_map(responsible_party).collect()
}

/// Maps a `CI_ResponsibleParty`; parties without a role code are dropped.
fn responsible_party(party: &Element) -> Option<Contact> {
    let role = party
        .descendant(gmd("CI_RoleCode"))
        .and_then(|r| r.attr(None, "codeListValue"))
        .map(str::trim)
        .filter(|r| !r.is_empty())?
        .to_string();

    let mut contact = Contact {
        role,
        ..Contact::default()
    };

    if let Some((name, href)) = party.child(gmd("individualName")).and_then(anchored_value) {
        contact.name_identifier = href.filter(|h| h.contains("orcid.org"));
        contact.full_name = Some(name.clone());
        contact.individual_name = Some(name);
    }
    if let Some((name, href)) = party.child(gmd("organisationName")).and_then(anchored_value) {
        contact.organization_identifier = href.filter(|h| h.contains("ror.org"));
        contact.organization_name = Some(name);
    }
    contact.position_name = party.child(gmd("positionName")).and_then(string_value);
    contact.email = party
        .descendant(gmd("electronicMailAddress"))
        .and_then(string_value)
        .map(|e| e.trim().to_string());

    Some(contact)
}

fn keywords(ident: &Element) -> Vec<Keyword> {
    let mut keywords = Vec::new();
    for block in ident.descendants(gmd("MD_Keywords")) {
        let thesaurus = block
            .child(gmd("thesaurusName"))
            .and_then(|t| t.descendant(gmd("title")))
            .and_then(string_value);
        for entry in block.children(gmd("keyword")) {
            if let Some((text, uri)) = anchored_value(entry) {
                let mut keyword = Keyword::new(text, KeywordType::Theme, uri);
                keyword.thesaurus.clone_from(&thesaurus);
                keywords.push(keyword);
            }
        }
    }
    keywords
}

fn online_resources(root: &Element) -> Vec<OnlineResource> {
    let Some(distribution) = root.child(gmd("distributionInfo")) else {
        return Vec::new();
    };
    distribution
        .descendants(gmd("CI_OnlineResource"))
        .into_iter()
        .filter_map(|resource| {
            let url = resource
                .path(&[gmd("linkage"), gmd("URL")])
                .and_then(Element::text)?
                .to_string();
            Some(OnlineResource {
                url,
                name: resource.child(gmd("name")).and_then(string_value),
                description: resource.child(gmd("description")).and_then(string_value),
                function: resource
                    .path(&[gmd("function"), gmd("CI_OnLineFunctionCode")])
                    .and_then(code_list_value),
                resource_type: Some(XML_ONLINE_RESOURCE_TYPE.to_string()),
            })
        })
        .collect()
}

fn spatial_extent(root: &Element) -> Option<SpatialExtent> {
    let bbox = root.descendant(gmd("EX_GeographicBoundingBox"))?;
    let bound = |name: &'static str| {
        bbox.path(&[gmd(name), DECIMAL])
            .and_then(Element::text)
            .and_then(|v| v.parse::<f64>().ok())
    };
    SpatialExtent::from_bounds(
        bound("westBoundLongitude"),
        bound("eastBoundLongitude"),
        bound("southBoundLatitude"),
        bound("northBoundLatitude"),
    )
}
