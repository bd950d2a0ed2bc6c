/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Protocol-level constants and the FIX field type system.
//!
//! This module provides:
//! - [`SOH`]: the field separator byte
//! - [`MANAGED_FIELDS`]: envelope fields callers must never supply
//! - [`FieldType`]: the closed set of FIX data types
//! - [`MsgCategory`]: admin/app message classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// SOH (Start of Header), the byte terminating every `tag=value` pair.
pub const SOH: u8 = 0x01;

/// Envelope fields whose values the serializer computes.
///
/// Supplying any of these in a message-level payload is a
/// [`PayloadError::ManagedConflict`](crate::error::PayloadError::ManagedConflict).
pub const MANAGED_FIELDS: [&str; 4] = ["BeginString", "BodyLength", "MsgType", "CheckSum"];

/// Returns true if `name` is one of the serializer-managed envelope fields.
#[inline]
#[must_use]
pub fn is_managed(name: &str) -> bool {
    MANAGED_FIELDS.contains(&name)
}

/// FIX field data type.
///
/// The set is closed: a definition using a type name outside this set is
/// rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// String value.
    String,
    /// Signed integer.
    Int,
    /// Byte length of an associated DATA field.
    Length,
    /// Message sequence number.
    SeqNum,
    /// Repetition count of a repeating group.
    NumInGroup,
    /// Floating point number.
    Float,
    /// Amount (price times quantity).
    Amt,
    /// Price.
    Price,
    /// Price offset.
    PriceOffset,
    /// Quantity.
    Qty,
    /// Percentage.
    Percentage,
    /// Single ASCII character.
    Char,
    /// Boolean, encoded as 'Y' or 'N'.
    Boolean,
    /// Raw bytes, length-prefixed by a preceding LENGTH field.
    Data,
    /// Space-separated list of values.
    MultipleValueString,
    /// Space-separated list of single characters.
    MultipleCharValue,
    /// Space-separated list of strings.
    MultipleStringValue,
    /// Country code (ISO 3166).
    Country,
    /// Currency code (ISO 4217).
    Currency,
    /// Exchange code (ISO 10383 MIC).
    Exchange,
    /// Month-year (YYYYMM, optionally with day or week).
    MonthYear,
    /// Local market date.
    LocalMktDate,
    /// UTC date.
    UtcDate,
    /// UTC date without time.
    UtcDateOnly,
    /// UTC time without date.
    UtcTimeOnly,
    /// UTC timestamp.
    UtcTimestamp,
    /// Time with timezone offset.
    TzTimeOnly,
    /// Timestamp with timezone offset.
    TzTimestamp,
    /// Language code (ISO 639-1).
    Language,
    /// XML data block.
    XmlData,
}

impl FieldType {
    /// Looks up a type from its dictionary name.
    ///
    /// # Arguments
    /// * `name` - The type name as it appears in the XML definition
    ///
    /// # Returns
    /// The matching type, or `None` for names outside the closed set.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_uppercase().as_str() {
            "STRING" => Self::String,
            "INT" => Self::Int,
            "LENGTH" => Self::Length,
            "SEQNUM" => Self::SeqNum,
            "NUMINGROUP" => Self::NumInGroup,
            "FLOAT" => Self::Float,
            "AMT" => Self::Amt,
            "PRICE" => Self::Price,
            "PRICEOFFSET" => Self::PriceOffset,
            "QTY" => Self::Qty,
            "PERCENTAGE" => Self::Percentage,
            "CHAR" => Self::Char,
            "BOOLEAN" => Self::Boolean,
            "DATA" => Self::Data,
            "MULTIPLEVALUESTRING" => Self::MultipleValueString,
            "MULTIPLECHARVALUE" => Self::MultipleCharValue,
            "MULTIPLESTRINGVALUE" => Self::MultipleStringValue,
            "COUNTRY" => Self::Country,
            "CURRENCY" => Self::Currency,
            "EXCHANGE" => Self::Exchange,
            "MONTHYEAR" => Self::MonthYear,
            "LOCALMKTDATE" => Self::LocalMktDate,
            "UTCDATE" => Self::UtcDate,
            "UTCDATEONLY" => Self::UtcDateOnly,
            "UTCTIMEONLY" => Self::UtcTimeOnly,
            "UTCTIMESTAMP" => Self::UtcTimestamp,
            "TZTIMEONLY" => Self::TzTimeOnly,
            "TZTIMESTAMP" => Self::TzTimestamp,
            "LANGUAGE" => Self::Language,
            "XMLDATA" => Self::XmlData,
            _ => return None,
        })
    }

    /// Returns true if values of this type must parse as integers.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::Length | Self::SeqNum | Self::NumInGroup
        )
    }

    /// Returns true if values of this type must parse as decimals.
    #[must_use]
    pub const fn is_decimal(&self) -> bool {
        matches!(
            self,
            Self::Float
                | Self::Amt
                | Self::Price
                | Self::PriceOffset
                | Self::Qty
                | Self::Percentage
        )
    }

    /// Returns true if values of this type are free-form text on the wire.
    #[must_use]
    pub const fn is_string_like(&self) -> bool {
        !self.is_integer() && !self.is_decimal() && !matches!(self, Self::Boolean | Self::Char | Self::Data)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "STRING",
            Self::Int => "INT",
            Self::Length => "LENGTH",
            Self::SeqNum => "SEQNUM",
            Self::NumInGroup => "NUMINGROUP",
            Self::Float => "FLOAT",
            Self::Amt => "AMT",
            Self::Price => "PRICE",
            Self::PriceOffset => "PRICEOFFSET",
            Self::Qty => "QTY",
            Self::Percentage => "PERCENTAGE",
            Self::Char => "CHAR",
            Self::Boolean => "BOOLEAN",
            Self::Data => "DATA",
            Self::MultipleValueString => "MULTIPLEVALUESTRING",
            Self::MultipleCharValue => "MULTIPLECHARVALUE",
            Self::MultipleStringValue => "MULTIPLESTRINGVALUE",
            Self::Country => "COUNTRY",
            Self::Currency => "CURRENCY",
            Self::Exchange => "EXCHANGE",
            Self::MonthYear => "MONTHYEAR",
            Self::LocalMktDate => "LOCALMKTDATE",
            Self::UtcDate => "UTCDATE",
            Self::UtcDateOnly => "UTCDATEONLY",
            Self::UtcTimeOnly => "UTCTIMEONLY",
            Self::UtcTimestamp => "UTCTIMESTAMP",
            Self::TzTimeOnly => "TZTIMEONLY",
            Self::TzTimestamp => "TZTIMESTAMP",
            Self::Language => "LANGUAGE",
            Self::XmlData => "XMLDATA",
        };
        write!(f, "{}", name)
    }
}

/// Message category, from the definition's `msgcat` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgCategory {
    /// Administrative (session level) message.
    Admin,
    /// Application message.
    App,
}

impl MsgCategory {
    /// Looks up a category from its dictionary name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(Self::Admin),
            "app" => Some(Self::App),
            _ => None,
        }
    }
}

impl fmt::Display for MsgCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::App => write!(f, "app"),
        }
    }
}
