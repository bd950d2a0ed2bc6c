/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Structured message payloads.
//!
//! A [`Payload`] is an ordered sequence of `(child-name, value)` pairs. It is
//! what a caller hands to the serializer and what the parser returns: field
//! children carry scalars, component children carry nested payloads, group
//! children carry one payload per repetition.

use crate::field::FieldValue;
use serde::{Deserialize, Serialize};

/// Value attached to one payload entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Scalar value of a field child.
    Scalar(FieldValue),
    /// Nested payload of a component child.
    Nested(Payload),
    /// Per-repetition payloads of a group child.
    Repeating(Vec<Payload>),
}

impl Value {
    /// Returns the scalar, if this is a field value.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&FieldValue> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the nested payload, if this is a component value.
    #[must_use]
    pub const fn as_nested(&self) -> Option<&Payload> {
        match self {
            Self::Nested(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the repetition list, if this is a group value.
    #[must_use]
    pub fn as_repeating(&self) -> Option<&[Payload]> {
        match self {
            Self::Repeating(reps) => Some(reps),
            _ => None,
        }
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        Self::Scalar(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(FieldValue::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(FieldValue::from(s))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Scalar(FieldValue::Int(v))
    }
}

impl From<rust_decimal::Decimal> for Value {
    fn from(v: rust_decimal::Decimal) -> Self {
        Self::Scalar(FieldValue::Decimal(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Scalar(FieldValue::Bool(v))
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Self::Scalar(FieldValue::Char(c))
    }
}

impl From<bytes::Bytes> for Value {
    fn from(d: bytes::Bytes) -> Self {
        Self::Scalar(FieldValue::Data(d))
    }
}

/// Ordered `(name, value)` sequence describing one composite's content.
///
/// Order is preserved exactly as pushed; the serializer emits entries in this
/// order and validates them against the composite's declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    entries: Vec<(String, Value)>,
}

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, preserving insertion order.
    ///
    /// # Arguments
    /// * `name` - The declared child name
    /// * `value` - The child's value
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a component child with a nested payload.
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, nested: Payload) -> Self {
        self.entries.push((name.into(), Value::Nested(nested)));
        self
    }

    /// Appends a group child with its repetitions.
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, repetitions: Vec<Payload>) -> Self {
        self.entries
            .push((name.into(), Value::Repeating(repetitions)));
        self
    }

    /// Returns the first value recorded under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the first scalar recorded under `name`.
    #[must_use]
    pub fn get_scalar(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).and_then(Value::as_scalar)
    }

    /// Iterates the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the payload has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Payload {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_preserves_order() {
        let payload = Payload::new()
            .with("SenderCompID", "CLIENT1")
            .with("TargetCompID", "BROKER")
            .with("MsgSeqNum", 1i64);

        let names: Vec<&str> = payload.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["SenderCompID", "TargetCompID", "MsgSeqNum"]);
    }

    #[test]
    fn test_payload_get_scalar() {
        let payload = Payload::new().with("HeartBtInt", 30i64);
        assert_eq!(
            payload.get_scalar("HeartBtInt"),
            Some(&FieldValue::Int(30))
        );
        assert_eq!(payload.get_scalar("EncryptMethod"), None);
    }

    #[test]
    fn test_group_value_access() {
        let reps = vec![
            Payload::new().with("AllocAccount", "A1"),
            Payload::new().with("AllocAccount", "A2"),
        ];
        let payload = Payload::new().with_group("NoAllocs", reps);

        let got = payload.get("NoAllocs").and_then(Value::as_repeating);
        assert_eq!(got.map(<[Payload]>::len), Some(2));
    }
}
