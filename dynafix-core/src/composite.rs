/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The composite model: fields, components, repeating groups, and messages.
//!
//! Composites form a directed acyclic graph with shared ownership: messages
//! reference components and fields, components reference components and
//! fields, groups reference fields and components. There are no parent
//! back-pointers; serialization receives everything it needs as arguments.
//!
//! - [`Composite`]: a child slot (field, component, or group)
//! - [`BaseComposite`]: ordered `(child, required)` list with the shared
//!   validation and serialization behavior
//! - [`Component`]: reusable grouping, serialized inline
//! - [`Group`]: repeating structure keyed by a NUMINGROUP count field
//! - [`Message`]: top-level composite with category and msg-type code

use crate::error::{PayloadError, SchemaError};
use crate::field::{FieldDef, FieldValue};
use crate::payload::{Payload, Value};
use crate::types::{is_managed, FieldType, MsgCategory, SOH};
use bytes::{BufMut, BytesMut};
use std::collections::HashSet;
use std::sync::Arc;

/// One child slot of a composite declaration.
///
/// This is the dispatchable "is a composite" capability: anything that can
/// appear as a child, expose a name, and serialize itself.
#[derive(Debug, Clone)]
pub enum Composite {
    /// A scalar field.
    Field(Arc<FieldDef>),
    /// A reusable component, inlined at the reference site.
    Component(Arc<Component>),
    /// A repeating group.
    Group(Arc<Group>),
}

impl Composite {
    /// Returns the child's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Component(c) => c.name(),
            Self::Group(g) => g.name(),
        }
    }

    /// Collects every field tag reachable from this child.
    pub fn collect_tags(&self, tags: &mut HashSet<u32>) {
        match self {
            Self::Field(f) => {
                tags.insert(f.tag);
            }
            Self::Component(c) => c.body().collect_tags(tags),
            Self::Group(g) => {
                tags.insert(g.count_field().tag);
                g.body().collect_tags(tags);
            }
        }
    }
}

/// Tracks a pending LENGTH field so the following DATA field can be checked
/// against it. DATA values are length-prefixed on the wire and may contain
/// SOH, so the separator alone cannot delimit them.
#[derive(Debug, Default)]
struct LengthState {
    pending: Option<usize>,
}

/// Ordered `(child, required)` declaration shared by components, groups, and
/// messages.
#[derive(Debug, Clone)]
pub struct BaseComposite {
    name: String,
    children: Vec<(Composite, bool)>,
}

impl BaseComposite {
    /// Creates an empty declaration.
    ///
    /// # Arguments
    /// * `name` - Name of the enclosing composite (used in error context)
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Returns the composite's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a child to the declaration.
    ///
    /// # Errors
    /// Returns [`SchemaError::XmlMalformed`] if a child with the same name is
    /// already declared.
    pub fn push_child(&mut self, child: Composite, required: bool) -> Result<(), SchemaError> {
        if self.children.iter().any(|(c, _)| c.name() == child.name()) {
            return Err(SchemaError::XmlMalformed(format!(
                "duplicate child '{}' in '{}'",
                child.name(),
                self.name
            )));
        }
        self.children.push((child, required));
        Ok(())
    }

    /// Returns the declared children in order.
    #[must_use]
    pub fn children(&self) -> &[(Composite, bool)] {
        &self.children
    }

    /// Looks up a declared child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Composite> {
        self.children
            .iter()
            .find(|(c, _)| c.name() == name)
            .map(|(c, _)| c)
    }

    /// Collects every field tag reachable from this declaration.
    pub fn collect_tags(&self, tags: &mut HashSet<u32>) {
        for (child, _) in &self.children {
            child.collect_tags(tags);
        }
    }

    /// Returns the flat set of reachable field tags.
    #[must_use]
    pub fn tag_set(&self) -> HashSet<u32> {
        let mut tags = HashSet::new();
        self.collect_tags(&mut tags);
        tags
    }

    /// Validates `payload` against the declaration and appends the encoded
    /// fields to `out`, each terminated by SOH.
    ///
    /// Entries are emitted in the caller's order. `message_level` enables the
    /// managed-field refusal that only applies to message payloads.
    ///
    /// # Errors
    /// [`PayloadError::MissingRequired`], [`PayloadError::UnknownChild`],
    /// [`PayloadError::Duplicate`], [`PayloadError::ManagedConflict`], or a
    /// value error from a child.
    pub fn serialize(
        &self,
        payload: &Payload,
        out: &mut BytesMut,
        message_level: bool,
    ) -> Result<(), PayloadError> {
        let mut lengths = LengthState::default();
        self.serialize_inner(payload, out, message_level, &mut lengths)
    }

    fn serialize_inner(
        &self,
        payload: &Payload,
        out: &mut BytesMut,
        message_level: bool,
        lengths: &mut LengthState,
    ) -> Result<(), PayloadError> {
        for (child, required) in &self.children {
            if *required && payload.get(child.name()).is_none() {
                return Err(PayloadError::MissingRequired {
                    name: child.name().to_string(),
                    parent: self.name.clone(),
                });
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for (name, _) in payload {
            if message_level && is_managed(name) {
                return Err(PayloadError::ManagedConflict(name.clone()));
            }
            if self.child(name).is_none() {
                return Err(PayloadError::UnknownChild {
                    name: name.clone(),
                    parent: self.name.clone(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(PayloadError::Duplicate {
                    name: name.clone(),
                    parent: self.name.clone(),
                });
            }
        }

        for (name, value) in payload {
            // Presence in the child set was checked above.
            let child = self.child(name).expect("declared child");
            match (child, value) {
                (Composite::Field(field), Value::Scalar(scalar)) => {
                    encode_field(field, scalar, out, lengths)?;
                }
                (Composite::Component(component), Value::Nested(nested)) => {
                    component
                        .body()
                        .serialize_inner(nested, out, false, lengths)?;
                }
                (Composite::Group(group), Value::Repeating(repetitions)) => {
                    group.serialize(repetitions, out)?;
                }
                (Composite::Field(_), _) => {
                    return Err(PayloadError::InvalidValue {
                        field: name.clone(),
                        reason: "expected a scalar value".to_string(),
                    })
                }
                (Composite::Component(_), _) => {
                    return Err(PayloadError::InvalidValue {
                        field: name.clone(),
                        reason: "expected a nested payload".to_string(),
                    })
                }
                (Composite::Group(_), _) => {
                    return Err(PayloadError::InvalidValue {
                        field: name.clone(),
                        reason: "expected a list of repetitions".to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

/// Encodes one field as `tag=value` + SOH, maintaining the LENGTH/DATA pairing.
fn encode_field(
    field: &FieldDef,
    value: &FieldValue,
    out: &mut BytesMut,
    lengths: &mut LengthState,
) -> Result<(), PayloadError> {
    let encoded = field.encode(value)?;

    match field.field_type {
        FieldType::Data => {
            let declared = lengths.pending.take().ok_or_else(|| PayloadError::InvalidValue {
                field: field.name.clone(),
                reason: "DATA field without a preceding LENGTH field".to_string(),
            })?;
            let rendered_len = encoded.len() - (encoded.iter().position(|&b| b == b'=').unwrap_or(0) + 1);
            if rendered_len != declared {
                return Err(PayloadError::InvalidValue {
                    field: field.name.clone(),
                    reason: format!(
                        "DATA length {} does not match declared LENGTH {}",
                        rendered_len, declared
                    ),
                });
            }
        }
        FieldType::Length => {
            let rendered = field.render(value)?;
            let text = std::str::from_utf8(&rendered).unwrap_or_default();
            lengths.pending = text.parse().ok();
        }
        _ => {
            lengths.pending = None;
        }
    }

    out.put_slice(&encoded);
    out.put_u8(SOH);
    Ok(())
}

/// Named reusable grouping of composites.
///
/// Purely structural: its serialized bytes are indistinguishable from its
/// children appearing inline at the point of reference.
#[derive(Debug, Clone)]
pub struct Component {
    body: BaseComposite,
}

impl Component {
    /// Wraps a declaration as a component.
    #[must_use]
    pub fn new(body: BaseComposite) -> Self {
        Self { body }
    }

    /// Returns the component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.body.name()
    }

    /// Returns the underlying declaration.
    #[must_use]
    pub fn body(&self) -> &BaseComposite {
        &self.body
    }
}

/// Repeating structure keyed by a NUMINGROUP count field.
///
/// The first declared child delimits repetitions on the wire: it must be
/// present in every repetition and must be serialized first.
#[derive(Debug, Clone)]
pub struct Group {
    count_field: Arc<FieldDef>,
    body: BaseComposite,
}

impl Group {
    /// Creates a group from its count field and per-repetition declaration.
    ///
    /// # Arguments
    /// * `count_field` - The NUMINGROUP field carrying the repetition count
    /// * `body` - Declaration of a single repetition
    ///
    /// # Errors
    /// Returns [`SchemaError::XmlMalformed`] when the count field's name does
    /// not equal the group name, when the count field is not NUMINGROUP, or
    /// when no child is required.
    pub fn new(count_field: Arc<FieldDef>, body: BaseComposite) -> Result<Self, SchemaError> {
        if count_field.name != body.name() {
            return Err(SchemaError::XmlMalformed(format!(
                "group '{}' keyed by mismatched count field '{}'",
                body.name(),
                count_field.name
            )));
        }
        if count_field.field_type != FieldType::NumInGroup {
            return Err(SchemaError::XmlMalformed(format!(
                "group count field '{}' is not NUMINGROUP",
                count_field.name
            )));
        }
        if body.children().is_empty() {
            return Err(SchemaError::XmlMalformed(format!(
                "group '{}' declares no children",
                body.name()
            )));
        }
        if !body.children().iter().any(|(_, required)| *required) {
            return Err(SchemaError::XmlMalformed(format!(
                "group '{}' declares no required child",
                body.name()
            )));
        }
        Ok(Self { count_field, body })
    }

    /// Returns the group's name (equal to its count field's name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.count_field.name
    }

    /// Returns the NUMINGROUP count field.
    #[must_use]
    pub fn count_field(&self) -> &Arc<FieldDef> {
        &self.count_field
    }

    /// Returns the per-repetition declaration.
    #[must_use]
    pub fn body(&self) -> &BaseComposite {
        &self.body
    }

    /// Returns the child that delimits repetitions on the wire.
    #[must_use]
    pub fn delimiter(&self) -> &Composite {
        &self.body.children()[0].0
    }

    /// Serializes the count field followed by each repetition.
    ///
    /// Zero repetitions are permitted: only the count field is emitted.
    ///
    /// # Errors
    /// [`PayloadError::GroupDelimiterMissing`] when a repetition does not
    /// start with the delimiter child, or any error from repetition
    /// validation.
    pub fn serialize(&self, repetitions: &[Payload], out: &mut BytesMut) -> Result<(), PayloadError> {
        let count = FieldValue::Int(repetitions.len() as i64);
        let encoded = self.count_field.encode(&count)?;
        out.put_slice(&encoded);
        out.put_u8(SOH);

        for repetition in repetitions {
            let leads_with_delimiter = repetition
                .iter()
                .next()
                .is_some_and(|(name, _)| name == self.delimiter().name());
            if !leads_with_delimiter {
                return Err(PayloadError::GroupDelimiterMissing(self.name().to_string()));
            }
            self.body.serialize(repetition, out, false)?;
        }

        Ok(())
    }
}

/// Top-level composite with a message-type code and category.
///
/// A message holds no reference to its protocol; envelope data (header,
/// trailer, BeginString) is supplied by the serializer as context.
#[derive(Debug, Clone)]
pub struct Message {
    msg_type: String,
    category: MsgCategory,
    body: BaseComposite,
}

impl Message {
    /// Creates a message.
    ///
    /// # Arguments
    /// * `msg_type` - The MsgType code (1-2 ASCII characters)
    /// * `category` - Admin or application
    /// * `body` - The message's declared children
    ///
    /// # Errors
    /// Returns [`SchemaError::XmlMalformed`] when the code is empty, longer
    /// than two characters, or not ASCII.
    pub fn new(
        msg_type: impl Into<String>,
        category: MsgCategory,
        body: BaseComposite,
    ) -> Result<Self, SchemaError> {
        let msg_type = msg_type.into();
        if msg_type.is_empty() || msg_type.len() > 2 || !msg_type.is_ascii() {
            return Err(SchemaError::XmlMalformed(format!(
                "message '{}' has invalid msgtype '{}'",
                body.name(),
                msg_type
            )));
        }
        Ok(Self {
            msg_type,
            category,
            body,
        })
    }

    /// Returns the message name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.body.name()
    }

    /// Returns the MsgType code.
    #[must_use]
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    /// Returns the message category.
    #[must_use]
    pub fn category(&self) -> MsgCategory {
        self.category
    }

    /// Returns the declared children.
    #[must_use]
    pub fn body(&self) -> &BaseComposite {
        &self.body
    }

    /// Validates a payload and appends its encoded fields to `out`.
    ///
    /// Managed envelope fields in the payload are refused.
    ///
    /// # Errors
    /// Any [`PayloadError`] from declaration validation or value encoding.
    pub fn serialize_payload(
        &self,
        payload: &Payload,
        out: &mut BytesMut,
    ) -> Result<(), PayloadError> {
        self.body.serialize(payload, out, true)
    }
}
