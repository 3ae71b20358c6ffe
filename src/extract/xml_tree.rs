//! Minimal namespace-resolved element tree over quick-xml.
//!
//! ISO-19115 documents are small and queried along many paths, so they are
//! read once into an owned tree. Element and attribute names are stored as
//! (namespace URI, local name) pairs; prefixes are irrelevant.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// Qualified name as (namespace URI, local name).
pub(crate) type QName = (&'static str, &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    ns: Option<String>,
    name: String,
    value: String,
}

/// One XML element with its text content and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    ns: Option<String>,
    name: String,
    attributes: Vec<Attribute>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// True when this element has the given qualified name.
    pub(crate) fn is(&self, (ns, name): QName) -> bool {
        self.name == name && self.ns.as_deref() == Some(ns)
    }

    /// Local name of the element.
    pub(crate) fn local_name(&self) -> &str {
        &self.name
    }

    /// Direct children with the given name.
    pub(crate) fn children(&self, qname: QName) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(move |c| c.is(qname))
    }

    /// All direct children.
    pub(crate) fn all_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// First direct child with the given name.
    pub(crate) fn child(&self, qname: QName) -> Option<&Element> {
        self.children(qname).next()
    }

    /// Follows a chain of direct children, returning the first full match.
    pub(crate) fn path(&self, steps: &[QName]) -> Option<&Element> {
        let Some((first, rest)) = steps.split_first() else {
            return Some(self);
        };
        self.children(*first).find_map(|c| c.path(rest))
    }

    /// All descendants (excluding self) with the given name, in document order.
    pub(crate) fn descendants(&self, qname: QName) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(qname, &mut found);
        found
    }

    /// First descendant with the given name.
    pub(crate) fn descendant(&self, qname: QName) -> Option<&Element> {
        self.children.iter().find_map(|c| {
            if c.is(qname) {
                Some(c)
            } else {
                c.descendant(qname)
            }
        })
    }

    fn collect_descendants<'a>(&'a self, qname: QName, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.is(qname) {
                found.push(child);
            }
            child.collect_descendants(qname, found);
        }
    }

    /// Trimmed text content, `None` when blank.
    pub(crate) fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Attribute value by namespace (or `None` for unqualified) and local name.
    pub(crate) fn attr(&self, ns: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.ns.as_deref() == ns)
            .map(|a| a.value.as_str())
    }
}

/// Parses a whole document into its root element.
///
/// # Errors
///
/// Returns a description of the first syntax error, or of a document with
/// no root element.
pub(crate) fn parse(text: &str) -> Result<Element, String> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event().map_err(|e| e.to_string())?;
        let ns = namespace_of(&resolved);

        match event {
            Event::Start(start) => {
                let element = open_element(&reader, ns, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, ns, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|e| e.to_string())?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    let bytes = data.into_inner();
                    let value = std::str::from_utf8(&bytes).map_err(|e| e.to_string())?;
                    current.text.push_str(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("document ended inside an open element".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn namespace_of(resolved: &ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Some(String::from_utf8_lossy(ns).into_owned()),
        _ => None,
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    ns: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element, String> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push(Attribute {
            ns: namespace_of(&resolved),
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: value.into_owned(),
        });
    }

    Ok(Element {
        ns,
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err("document has more than one root element".to_string());
    }
    *root = Some(element);
    Ok(())
}
