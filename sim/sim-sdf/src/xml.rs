//! Owned XML element tree.
//!
//! Documents are read once with `quick-xml` into a small owned tree. The
//! element parsers walk this tree, and plugins keep a subtree of it as their
//! uninterpreted parameter payload.

use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdfError};

/// A single XML element with its attributes, children and text content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XmlElement {
    /// Tag name, including any namespace prefix.
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated text content, trimmed.
    pub text: String,
}

impl XmlElement {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Add a child element.
    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Get an attribute value by name.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the first child element with the given tag.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Iterate over all child elements with the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Get the only child element with the given tag.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::DuplicateElement`] if the tag appears more than once.
    pub fn unique_child(&self, name: &'static str) -> Result<Option<&XmlElement>> {
        let mut matches = self.children_named(name);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(SdfError::duplicate_element(name, self.describe()));
        }
        Ok(first)
    }

    /// Check whether a child element with the given tag exists.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Text content of the element.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Short description used in diagnostics: `link 'base'`, or the bare tag
    /// name when the element is unnamed.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.attribute("name") {
            Some(name) => format!("{} '{}'", self.name, name),
            None => self.name.clone(),
        }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parse a document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::MalformedXml`] if the text is not a well-formed
    /// document with exactly one root element.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(SdfError::MalformedXml(
                            "document has more than one root element".into(),
                        ));
                    }
                    stack.push(start_element(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = start_element(e)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        SdfError::MalformedXml("closing tag without opening tag".into())
                    })?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::Text(ref t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| SdfError::MalformedXml(e.to_string()))?;
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::CData(ref t)) => {
                    let text = String::from_utf8_lossy(t);
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::Eof) => break,
                // Declarations, comments, processing instructions, doctype
                Ok(_) => {}
                Err(e) => {
                    return Err(SdfError::MalformedXml(format!(
                        "{e} (at byte {})",
                        reader.buffer_position()
                    )));
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(SdfError::MalformedXml(format!(
                "unexpected end of document inside <{}>",
                open.name
            )));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| SdfError::MalformedXml("document has no root element".into()))
    }

    /// Wrap an existing element as a document root.
    #[must_use]
    pub fn from_root(root: XmlElement) -> Self {
        Self { root }
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Consume the document and return its root element.
    #[must_use]
    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

impl FromStr for XmlDocument {
    type Err = SdfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Build an element (without children) from a start tag.
fn start_element(e: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            SdfError::MalformedXml(format!("bad attribute on <{}>: {err}", element.name))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| {
                SdfError::MalformedXml(format!(
                    "bad value for attribute '{key}' on <{}>: {err}",
                    element.name
                ))
            })?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

/// Attach a finished element to its parent, or make it the root.
fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(SdfError::MalformedXml(
            "document has more than one root element".into(),
        ))
    } else {
        *root = Some(element);
        Ok(())
    }
}

/// Append text content to the innermost open element.
fn append_text(stack: &mut [XmlElement], text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(element) => {
            if !element.text.is_empty() {
                element.text.push(' ');
            }
            element.text.push_str(text);
            Ok(())
        }
        None => Err(SdfError::MalformedXml(format!(
            "text outside of root element: {text:?}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_nested_tree() {
        let doc = XmlDocument::parse_str(
            r#"<?xml version="1.0"?>
            <!-- comment -->
            <model name="m">
                <pose>0 0 1 0 0 0</pose>
                <link name="a"/>
                <link name="b"><collision name="c"/></link>
            </model>"#,
        )
        .expect("should parse");

        let root = doc.root();
        assert_eq!(root.name, "model");
        assert_eq!(root.attribute("name"), Some("m"));
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.child("pose").map(XmlElement::text), Some("0 0 1 0 0 0"));
        assert_eq!(root.children_named("link").count(), 2);
        assert!(root.children[2].has_child("collision"));
    }

    #[test]
    fn test_entities_unescaped() {
        let doc = XmlDocument::parse_str(r#"<a key="x &amp; y">1 &lt; 2</a>"#).unwrap();
        assert_eq!(doc.root().attribute("key"), Some("x & y"));
        assert_eq!(doc.root().text(), "1 < 2");
    }

    #[test]
    fn test_cdata_text() {
        let doc = XmlDocument::parse_str("<a><![CDATA[<raw>]]></a>").unwrap();
        assert_eq!(doc.root().text(), "<raw>");
    }

    #[test]
    fn test_describe() {
        let named = XmlElement::new("link").with_attribute("name", "base");
        assert_eq!(named.describe(), "link 'base'");
        assert_eq!(XmlElement::new("geometry").describe(), "geometry");
    }

    #[test]
    fn test_malformed_documents() {
        for xml in [
            "",
            "   ",
            "<a>",
            "<a></b>",
            "<a/><b/>",
            "<a><b></a>",
            "text only",
            r#"<a x="1" x="2"/>"#,
        ] {
            let err = XmlDocument::parse_str(xml).expect_err(xml);
            assert_eq!(err.kind(), ErrorKind::MalformedXml, "input: {xml:?}");
        }
    }

    #[test]
    fn test_unique_child() {
        let e = XmlElement::new("link")
            .with_attribute("name", "l")
            .with_child(XmlElement::new("inertial"))
            .with_child(XmlElement::new("pose"))
            .with_child(XmlElement::new("pose"));
        assert!(e.unique_child("inertial").unwrap().is_some());
        assert!(e.unique_child("visual").unwrap().is_none());
        let err = e.unique_child("pose").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateElement);
        assert!(err.to_string().contains("link 'l'"));
    }

    #[test]
    fn test_from_str() {
        let doc: XmlDocument = "<world name='w'/>".parse().unwrap();
        assert_eq!(doc.root().describe(), "world 'w'");
        assert_eq!(doc.clone().into_root().name, "world");
    }
}
