/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the DynaFix FIX protocol codec.
//!
//! This module provides a unified error hierarchy using `thiserror`, split by
//! lifecycle phase:
//! - [`SchemaError`]: fatal at protocol construction
//! - [`PayloadError`]: returned to the caller of serialize, no partial output
//! - [`WireError`]: returned by parse; `NeedMore` consumes no bytes

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all DynaFix operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixError {
    /// Error while loading or extending a protocol definition.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Error while serializing a payload.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Error while parsing wire bytes.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

/// Errors raised while building a protocol from an XML definition.
///
/// All schema errors are fatal: no partially constructed protocol escapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The requested version tag has no bundled definition.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// The XML definition could not be read as a protocol description.
    #[error("malformed protocol definition: {0}")]
    XmlMalformed(String),

    /// A component reference never became resolvable.
    #[error("unresolved component reference '{name}' in '{referrer}'")]
    UnresolvedReference {
        /// Name of the component that could not be found.
        name: String,
        /// The composite that referenced it.
        referrer: String,
    },

    /// A field reference named a field absent from the field table.
    #[error("unresolved field reference '{name}' in '{referrer}'")]
    UnresolvedField {
        /// Name of the field that could not be found.
        name: String,
        /// The composite that referenced it.
        referrer: String,
    },

    /// An extension definition targets a different protocol.
    #[error("protocol mismatch: expected {expected}, got {got}")]
    ProtocolMismatch {
        /// Protocol id of the base definition.
        expected: String,
        /// Protocol id carried by the extension.
        got: String,
    },

    /// No bundled definition file was found at the discovered location.
    #[error("protocol definition file not found: {path}")]
    SpecNotFound {
        /// The path that was probed.
        path: String,
    },
}

/// Errors raised while validating and serializing a caller payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload names a child the composite does not declare.
    #[error("unknown child '{name}' in '{parent}'")]
    UnknownChild {
        /// The undeclared child name.
        name: String,
        /// The enclosing composite.
        parent: String,
    },

    /// A required child is absent from the payload.
    #[error("missing required child '{name}' in '{parent}'")]
    MissingRequired {
        /// The missing child name.
        name: String,
        /// The enclosing composite.
        parent: String,
    },

    /// A child appears more than once in the payload.
    #[error("duplicate child '{name}' in '{parent}'")]
    Duplicate {
        /// The repeated child name.
        name: String,
        /// The enclosing composite.
        parent: String,
    },

    /// A value does not conform to its field's type or enumeration.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue {
        /// The field whose value was rejected.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The payload supplies a field the serializer controls.
    #[error("managed field '{0}' must not appear in a payload")]
    ManagedConflict(String),

    /// A group repetition does not start with the declared delimiter field.
    #[error("group '{0}' repetition is missing its delimiter field")]
    GroupDelimiterMissing(String),
}

/// Errors raised while parsing wire bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The buffer does not yet hold a complete message. Nothing was consumed.
    #[error("incomplete message, need more data")]
    NeedMore,

    /// The buffer does not frame as `8=...|9=n|...|10=ccc|`.
    #[error("framing error: {0}")]
    FramingError(String),

    /// The BeginString does not match the protocol in use.
    #[error("wrong protocol: expected {expected}, got {got}")]
    WrongProtocol {
        /// BeginString of the protocol in use.
        expected: String,
        /// BeginString found on the wire.
        got: String,
    },

    /// Declared and computed checksums differ.
    #[error("checksum mismatch: expected {expected:03}, got {got:03}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Checksum declared in the message.
        got: u8,
    },

    /// A body token is not a well-formed `tag=value` pair.
    #[error("malformed field: {0}")]
    MalformedField(String),

    /// A tag does not belong to the composite being parsed.
    #[error("unknown tag {tag} in {context}")]
    UnknownTag {
        /// The offending tag number.
        tag: u32,
        /// The composite being parsed when it appeared.
        context: String,
    },

    /// A tag appears out of declared order.
    #[error("tag {tag} out of order in {context}")]
    OutOfOrder {
        /// The offending tag number.
        tag: u32,
        /// The composite being parsed when it appeared.
        context: String,
    },

    /// The body's MsgType code maps to no known message.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// A repeating group's entry count differs from its count field.
    #[error("group '{group}' count mismatch: declared {declared}, seen {seen}")]
    CountMismatch {
        /// The group whose count was wrong.
        group: String,
        /// Count carried by the NUMINGROUP field.
        declared: usize,
        /// Repetitions actually found.
        seen: usize,
    },
}
