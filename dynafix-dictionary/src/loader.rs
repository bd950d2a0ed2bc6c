/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Protocol definition loader.
//!
//! Walks the parsed XML tree and builds the composite graph:
//! 1. the field table,
//! 2. components via a deferred queue that retries entries whose component
//!    references are not yet constructible,
//! 3. header and trailer (anonymous composites, managed fields excluded),
//! 4. messages, where every reference must already resolve.
//!
//! Field references are always resolvable once step 1 ran, so a missing
//! field is fatal at any point. A pass over the component queue that
//! resolves nothing means a cycle or an unknown name, and fails rather than
//! spinning.

use crate::xml::XmlElement;
use dynafix_core::composite::{BaseComposite, Component, Composite, Group, Message};
use dynafix_core::error::SchemaError;
use dynafix_core::field::FieldDef;
use dynafix_core::types::{is_managed, FieldType, MsgCategory};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Field lookup tables, by name and by tag number.
pub(crate) type FieldTables = (
    HashMap<String, Arc<FieldDef>>,
    HashMap<u32, Arc<FieldDef>>,
);

/// Message lookup tables, by name and by msg-type code.
pub(crate) type MessageTables = (
    HashMap<String, Arc<Message>>,
    HashMap<String, Arc<Message>>,
);

/// Identity of a protocol definition document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProtocolIdent {
    /// The wire identifier, e.g. "FIX.4.4".
    pub id: String,
    /// The short version tag, e.g. "fix44".
    pub tag: String,
}

/// Why a composite could not be built from its description.
enum Unresolved {
    /// A `<component>` reference is not yet in the lookup. Deferrable while
    /// building components; fatal everywhere else.
    Component(String),
    /// Anything else; never deferrable.
    Fatal(SchemaError),
}

impl From<SchemaError> for Unresolved {
    fn from(e: SchemaError) -> Self {
        Self::Fatal(e)
    }
}

/// Reads the protocol identity from the root `<fix>` element.
///
/// # Errors
/// [`SchemaError::XmlMalformed`] for a non-`<fix>` root or unreadable
/// version attributes; [`SchemaError::UnsupportedVersion`] for anything
/// before FIX 4.x or a non-FIX document type.
pub(crate) fn protocol_ident(root: &XmlElement) -> Result<ProtocolIdent, SchemaError> {
    if root.name != "fix" {
        return Err(SchemaError::XmlMalformed(format!(
            "expected root element 'fix', found '{}'",
            root.name
        )));
    }

    let doc_type = root.require_attr("type")?;
    let major: u32 = root
        .require_attr("major")?
        .parse()
        .map_err(|_| SchemaError::XmlMalformed("major version is not a number".to_string()))?;
    let minor: u32 = root
        .require_attr("minor")?
        .parse()
        .map_err(|_| SchemaError::XmlMalformed("minor version is not a number".to_string()))?;

    let id = format!("{}.{}.{}", doc_type, major, minor);
    if doc_type != "FIX" || major < 4 {
        return Err(SchemaError::UnsupportedVersion(id));
    }

    Ok(ProtocolIdent {
        id,
        tag: format!("fix{}{}", major, minor),
    })
}

/// Builds the field table from the `<fields>` section.
///
/// # Errors
/// [`SchemaError::XmlMalformed`] on missing attributes, unknown type names,
/// duplicate tags or names, or duplicate enum tokens.
pub(crate) fn load_fields(root: &XmlElement) -> Result<FieldTables, SchemaError> {
    let mut by_name = HashMap::new();
    let mut by_number = HashMap::new();

    let Some(section) = root.child("fields") else {
        return Ok((by_name, by_number));
    };

    for elem in section.children_named("field") {
        let name = elem.require_attr("name")?;
        let number: u32 = elem.require_attr("number")?.parse().map_err(|_| {
            SchemaError::XmlMalformed(format!("field '{}' has a non-numeric tag", name))
        })?;
        let type_name = elem.require_attr("type")?;
        let field_type = FieldType::parse(type_name).ok_or_else(|| {
            SchemaError::XmlMalformed(format!(
                "field '{}' has unknown type '{}'",
                name, type_name
            ))
        })?;

        let mut def = FieldDef::new(number, name, field_type);

        let mut values = HashMap::new();
        for value in elem.children_named("value") {
            let token = value.require_attr("enum")?;
            let description = value.require_attr("description")?;
            if values
                .insert(token.to_string(), description.to_string())
                .is_some()
            {
                return Err(SchemaError::XmlMalformed(format!(
                    "field '{}' repeats enum token '{}'",
                    name, token
                )));
            }
        }
        if !values.is_empty() {
            def = def.with_values(values);
        }

        let def = Arc::new(def);
        if by_name.insert(def.name.clone(), Arc::clone(&def)).is_some() {
            return Err(SchemaError::XmlMalformed(format!(
                "duplicate field name '{}'",
                def.name
            )));
        }
        if by_number.insert(def.tag, def).is_some() {
            return Err(SchemaError::XmlMalformed(format!(
                "duplicate field tag {}",
                number
            )));
        }
    }

    debug!(fields = by_name.len(), "field table loaded");
    Ok((by_name, by_number))
}

/// Builds the component table from the `<components>` section.
///
/// Descriptions whose component references are not yet constructed are
/// requeued; the queue drains as dependencies appear. A full pass without
/// progress fails with [`SchemaError::UnresolvedReference`].
pub(crate) fn load_components(
    root: &XmlElement,
    fields: &HashMap<String, Arc<FieldDef>>,
) -> Result<HashMap<String, Arc<Component>>, SchemaError> {
    let mut components: HashMap<String, Arc<Component>> = HashMap::new();

    let Some(section) = root.child("components") else {
        return Ok(components);
    };

    let mut queue: VecDeque<&XmlElement> = section.children_named("component").collect();
    let mut passes = 0usize;

    while !queue.is_empty() {
        passes += 1;
        let mut progressed = false;
        let mut stuck: Option<(String, String)> = None;

        for _ in 0..queue.len() {
            let elem = queue.pop_front().expect("non-empty queue");
            let name = elem.require_attr("name")?;

            match resolve_children(name, elem, fields, &components, false) {
                Ok(body) => {
                    components.insert(name.to_string(), Arc::new(Component::new(body)));
                    progressed = true;
                }
                Err(Unresolved::Component(missing)) => {
                    if stuck.is_none() {
                        stuck = Some((missing, name.to_string()));
                    }
                    queue.push_back(elem);
                }
                Err(Unresolved::Fatal(e)) => return Err(e),
            }
        }

        if !progressed {
            let (name, referrer) = stuck.expect("no progress implies a stuck entry");
            return Err(SchemaError::UnresolvedReference { name, referrer });
        }
    }

    debug!(
        components = components.len(),
        passes, "component table loaded"
    );
    Ok(components)
}

/// Builds the header or trailer composite.
///
/// Managed envelope fields declared there are excluded: the envelope
/// serializer owns them. A missing section yields an empty composite.
///
/// # Errors
/// Unresolved references are fatal here.
pub(crate) fn load_section(
    root: &XmlElement,
    section_name: &str,
    fields: &HashMap<String, Arc<FieldDef>>,
    components: &HashMap<String, Arc<Component>>,
) -> Result<BaseComposite, SchemaError> {
    let Some(section) = root.child(section_name) else {
        return Ok(BaseComposite::new(section_name));
    };

    match resolve_children(section_name, section, fields, components, true) {
        Ok(body) => Ok(body),
        Err(Unresolved::Component(missing)) => Err(SchemaError::UnresolvedReference {
            name: missing,
            referrer: section_name.to_string(),
        }),
        Err(Unresolved::Fatal(e)) => Err(e),
    }
}

/// Builds the message tables from the `<messages>` section.
///
/// By this point all fields and components exist; any unresolved reference
/// is fatal.
pub(crate) fn load_messages(
    root: &XmlElement,
    fields: &HashMap<String, Arc<FieldDef>>,
    components: &HashMap<String, Arc<Component>>,
) -> Result<MessageTables, SchemaError> {
    let mut by_name = HashMap::new();
    let mut by_type = HashMap::new();

    let Some(section) = root.child("messages") else {
        return Ok((by_name, by_type));
    };

    for elem in section.children_named("message") {
        let name = elem.require_attr("name")?;
        let msg_type = elem.require_attr("msgtype")?;
        let category_name = elem.require_attr("msgcat")?;
        let category = MsgCategory::parse(category_name).ok_or_else(|| {
            SchemaError::XmlMalformed(format!(
                "message '{}' has unknown category '{}'",
                name, category_name
            ))
        })?;

        let body = match resolve_children(name, elem, fields, components, false) {
            Ok(body) => body,
            Err(Unresolved::Component(missing)) => {
                return Err(SchemaError::UnresolvedReference {
                    name: missing,
                    referrer: name.to_string(),
                })
            }
            Err(Unresolved::Fatal(e)) => return Err(e),
        };

        let message = Arc::new(Message::new(msg_type, category, body)?);
        by_name.insert(name.to_string(), Arc::clone(&message));
        by_type.insert(msg_type.to_string(), message);
    }

    debug!(messages = by_name.len(), "message table loaded");
    Ok((by_name, by_type))
}

/// Resolves an element's `<field>`, `<component>`, and `<group>` children
/// into an ordered declaration.
fn resolve_children(
    parent_name: &str,
    elem: &XmlElement,
    fields: &HashMap<String, Arc<FieldDef>>,
    components: &HashMap<String, Arc<Component>>,
    skip_managed: bool,
) -> Result<BaseComposite, Unresolved> {
    let mut body = BaseComposite::new(parent_name);

    for child in &elem.children {
        let required = child.attr("required") == Some("Y");
        match child.name.as_str() {
            "field" => {
                let name = child.require_attr("name")?;
                if skip_managed && is_managed(name) {
                    continue;
                }
                let field = fields.get(name).ok_or_else(|| {
                    Unresolved::Fatal(SchemaError::UnresolvedField {
                        name: name.to_string(),
                        referrer: parent_name.to_string(),
                    })
                })?;
                body.push_child(Composite::Field(Arc::clone(field)), required)?;
            }
            "component" => {
                let name = child.require_attr("name")?;
                let component = components
                    .get(name)
                    .ok_or_else(|| Unresolved::Component(name.to_string()))?;
                body.push_child(Composite::Component(Arc::clone(component)), required)?;
            }
            "group" => {
                let group = resolve_group(child, fields, components)?;
                body.push_child(Composite::Group(group), required)?;
            }
            _ => {}
        }
    }

    Ok(body)
}

/// Resolves a `<group>` declaration.
///
/// Component references are checked first so that a missing one defers the
/// whole enclosing description; field references come second and are fatal,
/// since the field table is complete before any composite is built.
fn resolve_group(
    elem: &XmlElement,
    fields: &HashMap<String, Arc<FieldDef>>,
    components: &HashMap<String, Arc<Component>>,
) -> Result<Arc<Group>, Unresolved> {
    let group_name = elem.require_attr("name")?;

    for child in elem.children_named("component") {
        let name = child.require_attr("name")?;
        if !components.contains_key(name) {
            return Err(Unresolved::Component(name.to_string()));
        }
    }

    let count_field = fields.get(group_name).ok_or_else(|| {
        Unresolved::Fatal(SchemaError::UnresolvedField {
            name: group_name.to_string(),
            referrer: group_name.to_string(),
        })
    })?;

    let body = resolve_children(group_name, elem, fields, components, false)?;
    let group = Group::new(Arc::clone(count_field), body)?;
    Ok(Arc::new(group))
}
