/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # DynaFix Tag-Value
//!
//! Envelope encoding and strict stream parsing for the DynaFix FIX codec.
//!
//! This crate turns validated payloads into framed `tag=value` messages and
//! back:
//!
//! - **Encoding**: `35=MsgType` + header + payload + trailer, wrapped in
//!   BeginString/BodyLength/CheckSum computed from the constructed body
//! - **Parsing**: framing with `NeedMore` on short buffers, BeginString and
//!   checksum verification, dictionary-aware tokenization (DATA fields honor
//!   their LENGTH prefix), and recursive-descent validation against the
//!   message declaration
//! - **Checksum**: mod-256 arithmetic and its 3-digit wire form
//! - **Diagnostics**: [`humanize`] for log-friendly rendering

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod humanize;

pub use checksum::{checksum_of, read_checksum, render_checksum};
pub use decoder::{parse, ParsedMessage};
pub use encoder::serialize;
pub use humanize::humanize;
