/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # DynaFix Dictionary
//!
//! Protocol definition loading for the DynaFix FIX codec.
//!
//! This crate turns a QuickFIX-style XML definition into a [`Protocol`]:
//! - **XML ingestion**: a generic element tree built with `quick-xml`
//! - **Deferred resolution**: components may reference components declared
//!   later in the document; a retry queue resolves them, and an
//!   unresolvable cycle fails instead of spinning
//! - **Lookup tables**: fields by name and number, components by name,
//!   messages by name and msg-type code
//! - **Extension overlay**: additive last-writer-wins merge of definitions
//!   with a matching protocol id
//! - **Resource discovery**: bundled definitions found via environment
//!   override or the packaged `spec/` directory

mod loader;
pub mod protocol;
pub mod resource;
pub mod xml;

pub use protocol::Protocol;
pub use resource::{locate_spec, read_spec, SPEC_DIR_ENV};
pub use xml::XmlElement;
