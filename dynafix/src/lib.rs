/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # DynaFix
//!
//! A dictionary-driven FIX protocol codec for Rust.
//!
//! DynaFix loads a QuickFIX-style XML protocol definition at runtime and
//! gives you a [`Protocol`](dictionary::Protocol) object that serializes
//! structured payloads into framed FIX messages and parses byte streams back
//! into typed, validated payloads. Validation is strict: tag order,
//! cardinality, enumerations, data types, and repeating-group structure are
//! all checked against the definition.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynafix::prelude::*;
//!
//! let protocol = Protocol::load("fix44")?;
//! let payload = Payload::new()
//!     .with("SenderCompID", "CLIENT1")
//!     .with("TargetCompID", "BROKER")
//!     .with("MsgSeqNum", 1i64)
//!     .with("SendingTime", "20090107-18:15:16")
//!     .with("EncryptMethod", "NONE_OTHER")
//!     .with("HeartBtInt", 30i64);
//!
//! let bytes = serialize(&protocol, "Logon", &payload)?;
//! let parsed = parse(&protocol, &bytes)?;
//! assert_eq!(parsed.message.name(), "Logon");
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: field and composite model, payloads, error definitions
//! - [`dictionary`]: XML definition loading and the `Protocol` object
//! - [`tagvalue`]: envelope encoding, stream parsing, checksum, diagnostics

pub mod core {
    //! Field and composite model, payloads, and error definitions.
    pub use dynafix_core::*;
}

pub mod dictionary {
    //! XML definition loading and the `Protocol` object.
    pub use dynafix_dictionary::*;
}

pub mod tagvalue {
    //! Envelope encoding, stream parsing, checksum, and diagnostics.
    pub use dynafix_tagvalue::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core model
    pub use dynafix_core::{
        BaseComposite, Component, Composite, FieldDef, FieldType, FieldValue, FixError, Group,
        Message, MsgCategory, Payload, PayloadError, Result, SchemaError, Value, WireError,
    };

    // Dictionary
    pub use dynafix_dictionary::{Protocol, SPEC_DIR_ENV};

    // Tag-value codec
    pub use dynafix_tagvalue::{humanize, parse, serialize, ParsedMessage};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_round_trip() {
        let protocol = Protocol::load("fix44").unwrap();
        let payload = Payload::new()
            .with("SenderCompID", "CLIENT1")
            .with("TargetCompID", "BROKER")
            .with("MsgSeqNum", 1i64)
            .with("SendingTime", "20090107-18:15:16")
            .with("EncryptMethod", "0")
            .with("HeartBtInt", 30i64);

        let bytes = serialize(&protocol, "Logon", &payload).unwrap();
        let parsed = parse(&protocol, &bytes).unwrap();
        assert_eq!(parsed.message.msg_type(), "A");
    }

    #[test]
    fn test_humanize_is_reexported() {
        assert_eq!(humanize(b"35=0\x01"), "35=0 | ");
    }
}
