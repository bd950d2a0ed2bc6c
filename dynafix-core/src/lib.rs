/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # DynaFix Core
//!
//! Core types and the composite model for the DynaFix FIX protocol codec.
//!
//! This crate provides the building blocks shared across all DynaFix crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field model**: `FieldDef`, `FieldType`, `FieldValue`
//! - **Composite model**: `BaseComposite`, `Component`, `Group`, `Message`
//! - **Payloads**: ordered `(name, value)` trees for serialize/parse
//!
//! The composite graph is built once by the dictionary loader and immutable
//! thereafter; all read paths take `&self`, so a protocol can be shared
//! across threads without synchronization.

pub mod composite;
pub mod error;
pub mod field;
pub mod payload;
pub mod types;

pub use composite::{BaseComposite, Component, Composite, Group, Message};
pub use error::{FixError, PayloadError, Result, SchemaError, WireError};
pub use field::{FieldDef, FieldValue};
pub use payload::{Payload, Value};
pub use types::{is_managed, FieldType, MsgCategory, MANAGED_FIELDS, SOH};
