/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field definitions and scalar values.
//!
//! This module provides:
//! - [`FieldValue`]: the scalar value types a caller supplies and a parser returns
//! - [`FieldDef`]: a field's identity (tag, name), data type, and optional enumeration
//!
//! A field definition is created once by the dictionary loader and immutable
//! thereafter; composites share it via `Arc`.

use crate::error::PayloadError;
use crate::types::{FieldType, SOH};
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scalar value of a single FIX field.
///
/// Callers build payloads from these; the parser reconstructs them according
/// to the field's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// String value.
    String(String),
    /// Integer value (INT, LENGTH, SEQNUM, NUMINGROUP).
    Int(i64),
    /// Decimal value (FLOAT, PRICE, QTY, AMT, PERCENTAGE, PRICEOFFSET).
    Decimal(Decimal),
    /// Boolean value, 'Y'/'N' on the wire.
    Bool(bool),
    /// Single ASCII character.
    Char(char),
    /// Raw bytes of a DATA field; may contain any byte including SOH.
    Data(Bytes),
}

impl FieldValue {
    /// Returns the value as a string slice, if it is a String variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an Int variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a Decimal, if it is a Decimal variant.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a Bool variant.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Renders the value to its wire bytes, without any framing.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            Self::String(s) => s.as_bytes().to_vec(),
            Self::Int(v) => {
                let mut buf = itoa::Buffer::new();
                buf.format(*v).as_bytes().to_vec()
            }
            Self::Decimal(v) => v.to_string().into_bytes(),
            Self::Bool(v) => vec![if *v { b'Y' } else { b'N' }],
            Self::Char(c) => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).as_bytes().to_vec()
            }
            Self::Data(d) => d.to_vec(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Int(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", if *v { "Y" } else { "N" }),
            Self::Char(c) => write!(f, "{}", c),
            Self::Data(d) => write!(f, "<{} bytes>", d.len()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<char> for FieldValue {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<Bytes> for FieldValue {
    fn from(d: Bytes) -> Self {
        Self::Data(d)
    }
}

/// Definition of a single FIX field.
///
/// Identity is the tag number and the name, both unique within a protocol
/// version. An optional enumeration restricts the value set; enum values may
/// be supplied either as the raw token or its human description, and always
/// serialize to the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field tag number.
    pub tag: u32,
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Enumeration mapping raw token to description, if any.
    pub values: Option<HashMap<String, String>>,
}

impl FieldDef {
    /// Creates a new field definition.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `name` - The field name
    /// * `field_type` - The field data type
    #[must_use]
    pub fn new(tag: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            tag,
            name: name.into(),
            field_type,
            values: None,
        }
    }

    /// Attaches an enumeration to the definition.
    ///
    /// # Arguments
    /// * `values` - Mapping of raw enum token to description
    #[must_use]
    pub fn with_values(mut self, values: HashMap<String, String>) -> Self {
        self.values = Some(values);
        self
    }

    /// Serializes a value as `tag=rendered`, without the SOH terminator.
    ///
    /// Enum fields accept either the token or the description and render the
    /// token. Values that do not conform to the field type are rejected.
    ///
    /// # Errors
    /// Returns [`PayloadError::InvalidValue`] when the value does not conform.
    pub fn encode(&self, value: &FieldValue) -> Result<Vec<u8>, PayloadError> {
        let rendered = self.render(value)?;
        let mut tag_buf = itoa::Buffer::new();
        let tag_str = tag_buf.format(self.tag);

        let mut out = Vec::with_capacity(tag_str.len() + 1 + rendered.len());
        out.extend_from_slice(tag_str.as_bytes());
        out.push(b'=');
        out.extend_from_slice(&rendered);
        Ok(out)
    }

    /// Renders and validates a value to its wire form, without the tag.
    ///
    /// # Errors
    /// Returns [`PayloadError::InvalidValue`] when the value does not conform.
    pub fn render(&self, value: &FieldValue) -> Result<Vec<u8>, PayloadError> {
        let mut raw = value.to_wire();

        if let Some(values) = &self.values {
            let token = std::str::from_utf8(&raw)
                .map_err(|_| self.invalid("enum value is not valid UTF-8"))?;
            if !values.contains_key(token) {
                // Accept the description as an alias for its token.
                match values.iter().find(|(_, desc)| desc.as_str() == token) {
                    Some((tok, _)) => raw = tok.clone().into_bytes(),
                    None => {
                        return Err(self.invalid(format!("'{}' is not in the enum set", token)))
                    }
                }
            }
        }

        self.validate_wire(&raw)?;
        Ok(raw)
    }

    /// Reconstructs a typed value from its wire bytes.
    ///
    /// The inverse of [`render`](Self::render): enum fields yield the raw
    /// token as a string; other fields yield the variant matching the
    /// declared type.
    ///
    /// # Errors
    /// Returns [`PayloadError::InvalidValue`] on malformed content.
    pub fn decode(&self, raw: &[u8]) -> Result<FieldValue, PayloadError> {
        self.validate_wire(raw)?;

        if let Some(values) = &self.values {
            let token = std::str::from_utf8(raw)
                .map_err(|_| self.invalid("enum value is not valid UTF-8"))?;
            if !values.contains_key(token) {
                return Err(self.invalid(format!("'{}' is not in the enum set", token)));
            }
            return Ok(FieldValue::String(token.to_string()));
        }

        if self.field_type == FieldType::Data {
            return Ok(FieldValue::Data(Bytes::copy_from_slice(raw)));
        }

        let text = std::str::from_utf8(raw).map_err(|_| self.invalid("value is not valid UTF-8"))?;

        Ok(if self.field_type.is_integer() {
            FieldValue::Int(
                text.parse()
                    .map_err(|_| self.invalid(format!("'{}' is not an integer", text)))?,
            )
        } else if self.field_type.is_decimal() {
            FieldValue::Decimal(
                text.parse()
                    .map_err(|_| self.invalid(format!("'{}' is not a decimal", text)))?,
            )
        } else {
            match self.field_type {
                FieldType::Boolean => FieldValue::Bool(text == "Y"),
                FieldType::Char => FieldValue::Char(text.chars().next().unwrap_or('\0')),
                _ => FieldValue::String(text.to_string()),
            }
        })
    }

    /// Checks rendered bytes against the declared type.
    fn validate_wire(&self, raw: &[u8]) -> Result<(), PayloadError> {
        if self.field_type == FieldType::Data {
            // DATA is length-prefixed and may contain any byte.
            return Ok(());
        }

        if raw.is_empty() {
            return Err(self.invalid("empty value"));
        }
        if raw.contains(&SOH) {
            return Err(self.invalid("value contains the field separator"));
        }
        if raw.contains(&b'=') && self.field_type.is_string_like() {
            return Err(self.invalid("value contains '='"));
        }

        if self.field_type.is_integer() {
            let text = std::str::from_utf8(raw).map_err(|_| self.invalid("not valid UTF-8"))?;
            let unsigned = self.field_type != FieldType::Int;
            let ok = if unsigned {
                text.parse::<u64>().is_ok()
            } else {
                text.parse::<i64>().is_ok()
            };
            if !ok {
                return Err(self.invalid(format!("'{}' is not a valid integer", text)));
            }
        } else if self.field_type.is_decimal() {
            let text = std::str::from_utf8(raw).map_err(|_| self.invalid("not valid UTF-8"))?;
            if text.parse::<Decimal>().is_err() {
                return Err(self.invalid(format!("'{}' is not a valid decimal", text)));
            }
        } else {
            match self.field_type {
                FieldType::Boolean => {
                    if raw != b"Y" && raw != b"N" {
                        return Err(self.invalid("expected 'Y' or 'N'"));
                    }
                }
                FieldType::Char => {
                    if raw.len() != 1 || !raw[0].is_ascii() {
                        return Err(self.invalid("expected a single ASCII character"));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> PayloadError {
        PayloadError::InvalidValue {
            field: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side_field() -> FieldDef {
        let mut values = HashMap::new();
        values.insert("1".to_string(), "BUY".to_string());
        values.insert("2".to_string(), "SELL".to_string());
        FieldDef::new(54, "Side", FieldType::Char).with_values(values)
    }

    #[test]
    fn test_encode_int() {
        let field = FieldDef::new(108, "HeartBtInt", FieldType::Int);
        let out = field.encode(&FieldValue::Int(30)).unwrap();
        assert_eq!(out, b"108=30");
    }

    #[test]
    fn test_encode_string_from_int_rejected_for_bool() {
        let field = FieldDef::new(141, "ResetSeqNumFlag", FieldType::Boolean);
        assert!(field.encode(&FieldValue::Int(1)).is_err());
        assert_eq!(field.encode(&FieldValue::Bool(true)).unwrap(), b"141=Y");
        assert_eq!(
            field.encode(&FieldValue::String("N".to_string())).unwrap(),
            b"141=N"
        );
    }

    #[test]
    fn test_encode_rejects_separator_in_string() {
        let field = FieldDef::new(58, "Text", FieldType::String);
        assert!(field
            .encode(&FieldValue::String("bad\x01text".to_string()))
            .is_err());
        assert!(field
            .encode(&FieldValue::String("bad=text".to_string()))
            .is_err());
    }

    #[test]
    fn test_enum_accepts_token_and_description() {
        let field = side_field();
        assert_eq!(
            field.encode(&FieldValue::String("1".to_string())).unwrap(),
            b"54=1"
        );
        assert_eq!(
            field
                .encode(&FieldValue::String("SELL".to_string()))
                .unwrap(),
            b"54=2"
        );
        assert!(field
            .encode(&FieldValue::String("HOLD".to_string()))
            .is_err());
    }

    #[test]
    fn test_enum_decode_yields_token() {
        let field = side_field();
        assert_eq!(
            field.decode(b"2").unwrap(),
            FieldValue::String("2".to_string())
        );
        assert!(field.decode(b"3").is_err());
    }

    #[test]
    fn test_decode_typed() {
        let qty = FieldDef::new(38, "OrderQty", FieldType::Qty);
        assert_eq!(
            qty.decode(b"50").unwrap(),
            FieldValue::Decimal(Decimal::from(50))
        );

        let seq = FieldDef::new(34, "MsgSeqNum", FieldType::SeqNum);
        assert_eq!(seq.decode(b"7").unwrap(), FieldValue::Int(7));
        assert!(seq.decode(b"-7").is_err());

        let flag = FieldDef::new(43, "PossDupFlag", FieldType::Boolean);
        assert_eq!(flag.decode(b"N").unwrap(), FieldValue::Bool(false));
        assert!(flag.decode(b"X").is_err());
    }

    #[test]
    fn test_data_allows_soh() {
        let data = FieldDef::new(96, "RawData", FieldType::Data);
        let payload = Bytes::from_static(b"ab\x01cd");
        let out = data.encode(&FieldValue::Data(payload.clone())).unwrap();
        assert_eq!(out, b"96=ab\x01cd");
        assert_eq!(data.decode(b"ab\x01cd").unwrap(), FieldValue::Data(payload));
    }

    #[test]
    fn test_empty_value_rejected() {
        let field = FieldDef::new(58, "Text", FieldType::String);
        assert!(field.encode(&FieldValue::String(String::new())).is_err());
        assert!(field.decode(b"").is_err());
    }
}
