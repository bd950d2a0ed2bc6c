/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The [`Protocol`] object: a fully resolved FIX version.
//!
//! Built once from an XML definition and immutable afterwards, with one
//! exception: [`Protocol::extend`] overlays additional fields and messages.
//! `extend` takes `&mut self`, so the single-writer discipline the overlay
//! requires is enforced by the borrow checker; every read path takes `&self`
//! and can be shared freely across threads.

use crate::loader;
use crate::resource;
use crate::xml::XmlElement;
use bytes::Bytes;
use dynafix_core::composite::{BaseComposite, Component, Message};
use dynafix_core::error::SchemaError;
use dynafix_core::field::FieldDef;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A loaded FIX protocol version: composite graph plus lookup tables.
#[derive(Debug, Clone)]
pub struct Protocol {
    version: String,
    protocol_id: String,
    begin_string: Bytes,
    header: BaseComposite,
    trailer: BaseComposite,
    fields_by_name: HashMap<String, Arc<FieldDef>>,
    fields_by_number: HashMap<u32, Arc<FieldDef>>,
    components: HashMap<String, Arc<Component>>,
    messages_by_name: HashMap<String, Arc<Message>>,
    messages_by_type: HashMap<String, Arc<Message>>,
}

impl Protocol {
    /// Loads a bundled protocol definition by version tag (e.g. `"fix44"`).
    ///
    /// The definition file is discovered through the environment override
    /// first, then the packaged `spec/` directory (see [`crate::resource`]).
    ///
    /// # Errors
    /// [`SchemaError::UnsupportedVersion`] for an unknown tag,
    /// [`SchemaError::SpecNotFound`] when the file is absent, or any loader
    /// error from the definition itself.
    pub fn load(tag: &str) -> Result<Self, SchemaError> {
        let xml = resource::read_spec(tag)?;
        Self::from_xml(&xml)
    }

    /// Builds a protocol from an XML definition string.
    ///
    /// # Errors
    /// Any [`SchemaError`] raised by the loader; nothing partially
    /// constructed escapes.
    pub fn from_xml(xml: &str) -> Result<Self, SchemaError> {
        let root = XmlElement::parse(xml)?;
        let ident = loader::protocol_ident(&root)?;

        let (fields_by_name, fields_by_number) = loader::load_fields(&root)?;
        let components = loader::load_components(&root, &fields_by_name)?;
        let header = loader::load_section(&root, "header", &fields_by_name, &components)?;
        let trailer = loader::load_section(&root, "trailer", &fields_by_name, &components)?;
        let (messages_by_name, messages_by_type) =
            loader::load_messages(&root, &fields_by_name, &components)?;

        let begin_string = Bytes::from(format!("8={}", ident.id));

        debug!(
            protocol = %ident.id,
            fields = fields_by_name.len(),
            components = components.len(),
            messages = messages_by_name.len(),
            "protocol loaded"
        );

        Ok(Self {
            version: ident.tag,
            protocol_id: ident.id,
            begin_string,
            header,
            trailer,
            fields_by_name,
            fields_by_number,
            components,
            messages_by_name,
            messages_by_type,
        })
    }

    /// Overlays an extension definition onto this protocol.
    ///
    /// The extension's protocol id must equal this protocol's id exactly.
    /// Its fields and messages are merged last-writer-wins; on any error the
    /// base lookups are left untouched.
    ///
    /// # Errors
    /// [`SchemaError::ProtocolMismatch`] on an id mismatch, or any loader
    /// error from the extension document.
    pub fn extend(&mut self, xml: &str) -> Result<(), SchemaError> {
        let root = XmlElement::parse(xml)?;
        let ident = loader::protocol_ident(&root)?;
        if ident.id != self.protocol_id {
            return Err(SchemaError::ProtocolMismatch {
                expected: self.protocol_id.clone(),
                got: ident.id,
            });
        }

        let (new_fields_by_name, new_fields_by_number) = loader::load_fields(&root)?;

        // Messages in the extension may reference base fields as well as
        // newly introduced ones, so they resolve against the merged view.
        let mut merged_fields = self.fields_by_name.clone();
        merged_fields.extend(new_fields_by_name.clone());
        let (new_messages_by_name, new_messages_by_type) =
            loader::load_messages(&root, &merged_fields, &self.components)?;

        debug!(
            protocol = %self.protocol_id,
            fields = new_fields_by_name.len(),
            messages = new_messages_by_name.len(),
            "extension applied"
        );

        self.fields_by_name.extend(new_fields_by_name);
        self.fields_by_number.extend(new_fields_by_number);
        self.messages_by_name.extend(new_messages_by_name);
        self.messages_by_type.extend(new_messages_by_type);
        Ok(())
    }

    /// Returns the short version tag, e.g. `"fix44"`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the wire protocol id, e.g. `"FIX.4.4"`.
    #[must_use]
    pub fn protocol_id(&self) -> &str {
        &self.protocol_id
    }

    /// Returns the pre-serialized BeginString field, `8=<id>`, without the
    /// SOH terminator. Reused by every outbound message.
    #[must_use]
    pub fn begin_string(&self) -> &Bytes {
        &self.begin_string
    }

    /// Returns the header declaration (managed fields excluded).
    #[must_use]
    pub fn header(&self) -> &BaseComposite {
        &self.header
    }

    /// Returns the trailer declaration (managed fields excluded).
    #[must_use]
    pub fn trailer(&self) -> &BaseComposite {
        &self.trailer
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&Arc<FieldDef>> {
        self.fields_by_name.get(name)
    }

    /// Looks up a field by tag number.
    #[must_use]
    pub fn field_by_number(&self, tag: u32) -> Option<&Arc<FieldDef>> {
        self.fields_by_number.get(&tag)
    }

    /// Looks up a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Arc<Component>> {
        self.components.get(name)
    }

    /// Looks up a message by name.
    #[must_use]
    pub fn message_by_name(&self, name: &str) -> Option<&Arc<Message>> {
        self.messages_by_name.get(name)
    }

    /// Looks up a message by its MsgType code.
    #[must_use]
    pub fn message_by_type(&self, msg_type: &str) -> Option<&Arc<Message>> {
        self.messages_by_type.get(msg_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
<fix type="FIX" major="4" minor="4">
  <header>
    <field name="BeginString" required="Y"/>
    <field name="BodyLength" required="Y"/>
    <field name="MsgType" required="Y"/>
    <field name="SenderCompID" required="Y"/>
    <field name="TargetCompID" required="Y"/>
  </header>
  <trailer>
    <field name="CheckSum" required="Y"/>
  </trailer>
  <messages>
    <message name="Heartbeat" msgtype="0" msgcat="admin">
      <field name="TestReqID" required="N"/>
    </message>
  </messages>
  <components/>
  <fields>
    <field number="8" name="BeginString" type="STRING"/>
    <field number="9" name="BodyLength" type="LENGTH"/>
    <field number="10" name="CheckSum" type="STRING"/>
    <field number="35" name="MsgType" type="STRING"/>
    <field number="49" name="SenderCompID" type="STRING"/>
    <field number="56" name="TargetCompID" type="STRING"/>
    <field number="112" name="TestReqID" type="STRING"/>
  </fields>
</fix>"#;

    const EXTENSION: &str = r#"
<fix type="FIX" major="4" minor="4">
  <messages>
    <message name="PingRequest" msgtype="U1" msgcat="app">
      <field name="PingID" required="Y"/>
    </message>
  </messages>
  <fields>
    <field number="5001" name="PingID" type="STRING"/>
  </fields>
</fix>"#;

    #[test]
    fn test_from_xml_builds_lookups() {
        let protocol = Protocol::from_xml(BASE).unwrap();
        assert_eq!(protocol.protocol_id(), "FIX.4.4");
        assert_eq!(protocol.version(), "fix44");
        assert_eq!(&protocol.begin_string()[..], b"8=FIX.4.4");

        assert_eq!(protocol.field_by_name("TestReqID").unwrap().tag, 112);
        assert!(Arc::ptr_eq(
            protocol.field_by_name("TestReqID").unwrap(),
            protocol.field_by_number(112).unwrap()
        ));
        assert!(protocol.message_by_name("Heartbeat").is_some());
        assert!(protocol.message_by_type("0").is_some());
    }

    #[test]
    fn test_extend_overlays_fields_and_messages() {
        let mut protocol = Protocol::from_xml(BASE).unwrap();
        protocol.extend(EXTENSION).unwrap();

        assert_eq!(protocol.field_by_name("PingID").unwrap().tag, 5001);
        assert!(protocol.field_by_number(5001).is_some());
        assert!(protocol.message_by_type("U1").is_some());
        // Base entries remain resolvable.
        assert!(protocol.message_by_type("0").is_some());
        assert!(protocol.field_by_name("TestReqID").is_some());
    }

    #[test]
    fn test_extend_rejects_mismatched_protocol() {
        let mut protocol = Protocol::from_xml(BASE).unwrap();
        let foreign = EXTENSION.replace(r#"minor="4""#, r#"minor="2""#);
        let err = protocol.extend(&foreign).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ProtocolMismatch {
                expected: "FIX.4.4".to_string(),
                got: "FIX.4.2".to_string(),
            }
        );
        // Nothing was merged.
        assert!(protocol.field_by_name("PingID").is_none());
        assert!(protocol.message_by_type("U1").is_none());
    }

    #[test]
    fn test_extend_failure_leaves_base_untouched() {
        let mut protocol = Protocol::from_xml(BASE).unwrap();
        let broken = r#"
<fix type="FIX" major="4" minor="4">
  <messages>
    <message name="Broken" msgtype="U2" msgcat="app">
      <field name="NoSuchField" required="Y"/>
    </message>
  </messages>
</fix>"#;
        assert!(protocol.extend(broken).is_err());
        assert!(protocol.message_by_type("U2").is_none());
    }
}
