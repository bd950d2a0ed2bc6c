/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Generic XML element tree.
//!
//! The protocol definition is first materialized as a tree of elements with
//! attribute maps; the loader then walks the tree. Representing children as a
//! plain vector sidesteps the single-vs-many ambiguity some attribute-map
//! bindings have: one `<field>` and ten `<field>`s read the same way.

use dynafix_core::error::SchemaError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// One XML element: name, attributes, and child elements in document order.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Element name.
    pub name: String,
    /// Attribute map.
    pub attrs: HashMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parses a document into its root element.
    ///
    /// Text content is ignored: protocol definitions carry everything in
    /// attributes.
    ///
    /// # Errors
    /// Returns [`SchemaError::XmlMalformed`] on unreadable XML or when the
    /// document has no root element.
    pub fn parse(xml: &str) -> Result<Self, SchemaError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        SchemaError::XmlMalformed("unbalanced closing tag".to_string())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(SchemaError::XmlMalformed(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(SchemaError::XmlMalformed(
                "unclosed element at end of document".to_string(),
            ));
        }
        root.ok_or_else(|| SchemaError::XmlMalformed("no root element".to_string()))
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Returns an attribute value or a malformed-definition error naming it.
    ///
    /// # Errors
    /// Returns [`SchemaError::XmlMalformed`] when the attribute is absent.
    pub fn require_attr(&self, key: &str) -> Result<&str, SchemaError> {
        self.attr(key).ok_or_else(|| {
            SchemaError::XmlMalformed(format!(
                "element '{}' is missing attribute '{}'",
                self.name, key
            ))
        })
    }

    /// Returns the first child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Iterates the children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement, SchemaError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| SchemaError::XmlMalformed(e.to_string()))?
        .to_string();

    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| SchemaError::XmlMalformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| SchemaError::XmlMalformed(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| SchemaError::XmlMalformed(e.to_string()))?
            .into_owned();
        attrs.insert(key, value);
    }

    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = XmlElement::parse(
            r#"<fix type="FIX" major="4" minor="4">
                 <fields>
                   <field number="8" name="BeginString" type="STRING"/>
                   <field number="98" name="EncryptMethod" type="INT">
                     <value enum="0" description="NONE_OTHER"/>
                   </field>
                 </fields>
               </fix>"#,
        )
        .unwrap();

        assert_eq!(root.name, "fix");
        assert_eq!(root.attr("major"), Some("4"));

        let fields = root.child("fields").unwrap();
        assert_eq!(fields.children_named("field").count(), 2);

        let encrypt = &fields.children[1];
        assert_eq!(encrypt.attr("name"), Some("EncryptMethod"));
        assert_eq!(encrypt.children[0].attr("enum"), Some("0"));
    }

    #[test]
    fn test_single_child_reads_like_many() {
        let root = XmlElement::parse(r#"<m><field name="a"/></m>"#).unwrap();
        assert_eq!(root.children_named("field").count(), 1);

        let root = XmlElement::parse(r#"<m><field name="a"/><field name="b"/></m>"#).unwrap();
        assert_eq!(root.children_named("field").count(), 2);
    }

    #[test]
    fn test_require_attr() {
        let root = XmlElement::parse(r#"<field name="Side"/>"#).unwrap();
        assert_eq!(root.require_attr("name").unwrap(), "Side");
        assert!(matches!(
            root.require_attr("number"),
            Err(SchemaError::XmlMalformed(_))
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(XmlElement::parse("<fix><open></fix>").is_err());
        assert!(XmlElement::parse("").is_err());
    }
}
