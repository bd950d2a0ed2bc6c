/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Envelope serializer.
//!
//! Wraps a validated message body in the FIX envelope:
//!
//! ```text
//! 8=<BeginString>|9=<BodyLength>|35=<MsgType>|<header>|<payload>|<trailer>|10=<CheckSum>|
//! ```
//!
//! BeginString, BodyLength, MsgType, and CheckSum are managed: their values
//! come from the protocol and the constructed body, never from the caller.
//! Header and trailer entries found in the payload are emitted in the
//! order their section declares them; message-level entries keep the
//! caller's order.

use crate::checksum::{checksum_of, render_checksum};
use bytes::{BufMut, BytesMut};
use dynafix_core::composite::BaseComposite;
use dynafix_core::error::PayloadError;
use dynafix_core::payload::Payload;
use dynafix_core::types::{is_managed, SOH};
use dynafix_dictionary::Protocol;

/// Serializes a message payload into a complete framed FIX message.
///
/// The payload is a flat `(name, value)` sequence mixing header, message,
/// and trailer children; each entry is routed to the section that declares
/// it.
///
/// # Arguments
/// * `protocol` - The protocol supplying envelope data and declarations
/// * `message_name` - Name of the message to serialize (e.g. `"Logon"`)
/// * `payload` - The ordered payload
///
/// # Errors
/// [`PayloadError::UnknownChild`] when no message has that name or an entry
/// is declared nowhere; [`PayloadError::ManagedConflict`] when the payload
/// supplies an envelope field; any validation error from the declarations.
/// No partial output escapes on error.
pub fn serialize(
    protocol: &Protocol,
    message_name: &str,
    payload: &Payload,
) -> Result<BytesMut, PayloadError> {
    let message = protocol
        .message_by_name(message_name)
        .ok_or_else(|| PayloadError::UnknownChild {
            name: message_name.to_string(),
            parent: protocol.protocol_id().to_string(),
        })?;

    let mut header_part = Payload::new();
    let mut trailer_part = Payload::new();
    let mut body_part = Payload::new();

    for (name, value) in payload {
        if is_managed(name) {
            return Err(PayloadError::ManagedConflict(name.clone()));
        }
        if protocol.header().child(name).is_some() {
            header_part.push(name.clone(), value.clone());
        } else if protocol.trailer().child(name).is_some() {
            trailer_part.push(name.clone(), value.clone());
        } else {
            body_part.push(name.clone(), value.clone());
        }
    }

    let mut body = BytesMut::with_capacity(256);
    body.put_slice(b"35=");
    body.put_slice(message.msg_type().as_bytes());
    body.put_u8(SOH);

    let header_ordered = declared_order(protocol.header(), &header_part);
    protocol.header().serialize(&header_ordered, &mut body, false)?;

    message.serialize_payload(&body_part, &mut body)?;

    let trailer_ordered = declared_order(protocol.trailer(), &trailer_part);
    protocol
        .trailer()
        .serialize(&trailer_ordered, &mut body, false)?;

    let mut out = BytesMut::with_capacity(body.len() + 32);
    out.put_slice(protocol.begin_string());
    out.put_u8(SOH);
    out.put_slice(b"9=");
    let mut len_buf = itoa::Buffer::new();
    out.put_slice(len_buf.format(body.len()).as_bytes());
    out.put_u8(SOH);
    out.put_slice(&body);

    let checksum = checksum_of(&out);
    out.put_slice(b"10=");
    out.put_slice(&render_checksum(checksum));
    out.put_u8(SOH);

    Ok(out)
}

/// Reorders section entries into the section's declared order.
///
/// Every entry already names a child of the section, so reordering loses
/// nothing.
fn declared_order(section: &BaseComposite, entries: &Payload) -> Payload {
    let mut ordered = Payload::new();
    for (child, _) in section.children() {
        if let Some(value) = entries.get(child.name()) {
            ordered.push(child.name().to_string(), value.clone());
        }
    }
    ordered
}
