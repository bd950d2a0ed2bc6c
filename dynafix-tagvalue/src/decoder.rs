/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Strict stream parser.
//!
//! [`parse`] frames one message out of a byte buffer, verifies BeginString
//! and checksum, tokenizes the body, and reconstructs the payload by
//! recursive descent over the message declaration. It performs no I/O: a
//! caller wanting stream semantics appends bytes and retries on
//! [`WireError::NeedMore`], which never consumes anything.
//!
//! Tokenization is dictionary-aware: after a LENGTH field, a following
//! DATA field's value is taken as exactly the declared byte count, so DATA
//! values may contain SOH.

use crate::checksum::{checksum_of, read_checksum};
use dynafix_core::composite::{BaseComposite, Composite, Group, Message};
use dynafix_core::error::{FixError, PayloadError, WireError};
use dynafix_core::field::FieldValue;
use dynafix_core::payload::{Payload, Value};
use dynafix_core::types::{FieldType, SOH};
use dynafix_dictionary::Protocol;
use memchr::memchr;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;

/// Tag of the MsgType field, the mandatory first body field.
const MSG_TYPE_TAG: u32 = 35;

/// Wire length of the `10=ccc\x01` trailer field.
const TRAILER_LEN: usize = 7;

/// A successfully parsed message.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// The message declaration the body matched.
    pub message: Arc<Message>,
    /// Reconstructed payload: header entries, then message entries, then
    /// trailer entries, each mirroring the declaration.
    pub payload: Payload,
    /// Bytes consumed from the front of the buffer.
    pub consumed: usize,
}

/// One framed message within the caller's buffer.
struct Frame<'a> {
    body: &'a [u8],
    consumed: usize,
}

/// One `tag=value` token of the body.
#[derive(Debug, Clone, Copy)]
struct RawField<'a> {
    tag: u32,
    value: &'a [u8],
}

/// Parses one message from the front of `buf`.
///
/// # Arguments
/// * `protocol` - The protocol to validate against
/// * `buf` - Buffered wire bytes; may hold a partial or several messages
///
/// # Errors
/// [`WireError::NeedMore`] when the buffer holds no complete message (no
/// bytes are consumed); any other [`WireError`] for framing, protocol,
/// checksum, or structural violations; [`PayloadError`] for field values
/// and cardinality violations surfaced during descent.
pub fn parse(protocol: &Protocol, buf: &[u8]) -> Result<ParsedMessage, FixError> {
    let frame = frame(protocol, buf)?;
    let tokens = tokenize(protocol, frame.body)?;

    let first = tokens
        .first()
        .ok_or_else(|| WireError::FramingError("empty message body".to_string()))?;
    if first.tag != MSG_TYPE_TAG {
        return Err(WireError::FramingError("first body field is not MsgType".to_string()).into());
    }
    let code = std::str::from_utf8(first.value)
        .map_err(|_| WireError::MalformedField("MsgType value is not UTF-8".to_string()))?;
    let message = Arc::clone(
        protocol
            .message_by_type(code)
            .ok_or_else(|| WireError::UnknownMessageType(code.to_string()))?,
    );

    let payload = descend(protocol, &message, &tokens)?;

    Ok(ParsedMessage {
        message,
        payload,
        consumed: frame.consumed,
    })
}

/// Locates `8=...|9=n|<body>|10=ccc|` at the start of the buffer and
/// verifies BeginString and checksum.
fn frame<'a>(protocol: &Protocol, buf: &'a [u8]) -> Result<Frame<'a>, WireError> {
    if buf.len() < 2 {
        return Err(WireError::NeedMore);
    }
    if &buf[..2] != b"8=" {
        return Err(WireError::FramingError(
            "message does not start with '8='".to_string(),
        ));
    }
    let Some(begin_end) = memchr(SOH, buf) else {
        return Err(WireError::NeedMore);
    };

    let length_start = begin_end + 1;
    if buf.len() < length_start + 2 {
        return Err(WireError::NeedMore);
    }
    if &buf[length_start..length_start + 2] != b"9=" {
        return Err(WireError::FramingError(
            "BodyLength does not follow BeginString".to_string(),
        ));
    }
    let Some(rel) = memchr(SOH, &buf[length_start..]) else {
        return Err(WireError::NeedMore);
    };
    let length_end = length_start + rel;
    let body_len = parse_decimal(&buf[length_start + 2..length_end])
        .ok_or_else(|| WireError::FramingError("invalid BodyLength value".to_string()))?;

    let body_start = length_end + 1;
    let total = body_start
        .checked_add(body_len)
        .and_then(|n| n.checked_add(TRAILER_LEN))
        .ok_or_else(|| WireError::FramingError("BodyLength overflows".to_string()))?;
    if buf.len() < total {
        return Err(WireError::NeedMore);
    }

    let trailer = &buf[body_start + body_len..total];
    if &trailer[..3] != b"10=" || trailer[6] != SOH {
        return Err(WireError::FramingError(
            "body is not followed by a CheckSum field".to_string(),
        ));
    }

    if buf[..begin_end] != protocol.begin_string()[..] {
        return Err(WireError::WrongProtocol {
            expected: protocol.protocol_id().to_string(),
            got: String::from_utf8_lossy(&buf[2..begin_end]).into_owned(),
        });
    }

    let declared = read_checksum(&trailer[3..6])
        .ok_or_else(|| WireError::FramingError("invalid CheckSum value".to_string()))?;
    let computed = checksum_of(&buf[..body_start + body_len]);
    if computed != declared {
        return Err(WireError::ChecksumMismatch {
            expected: computed,
            got: declared,
        });
    }

    Ok(Frame {
        body: &buf[body_start..body_start + body_len],
        consumed: total,
    })
}

/// Splits the body into `tag=value` tokens.
///
/// A DATA field following a LENGTH field is extracted by the declared byte
/// count instead of the separator.
fn tokenize<'a>(
    protocol: &Protocol,
    body: &'a [u8],
) -> Result<SmallVec<[RawField<'a>; 32]>, WireError> {
    let mut tokens = SmallVec::new();
    let mut offset = 0;
    let mut pending_length: Option<usize> = None;

    while offset < body.len() {
        let rest = &body[offset..];
        let eq = memchr(b'=', rest)
            .ok_or_else(|| WireError::MalformedField("field without '='".to_string()))?;
        let tag = parse_tag(&rest[..eq]).ok_or_else(|| {
            WireError::MalformedField(format!(
                "invalid tag '{}'",
                String::from_utf8_lossy(&rest[..eq])
            ))
        })?;

        let def = protocol.field_by_number(tag);
        let value_start = eq + 1;
        let is_data = def.is_some_and(|d| d.field_type == FieldType::Data);

        let value = match (pending_length, is_data) {
            (Some(declared), true) => {
                let end = value_start.checked_add(declared).ok_or_else(|| {
                    WireError::MalformedField(format!("DATA field {} length overflows", tag))
                })?;
                if rest.len() <= end {
                    return Err(WireError::MalformedField(format!(
                        "DATA field {} exceeds the body",
                        tag
                    )));
                }
                if rest[end] != SOH {
                    return Err(WireError::MalformedField(format!(
                        "DATA field {} is not SOH-terminated at its declared length",
                        tag
                    )));
                }
                offset += end + 1;
                &rest[value_start..end]
            }
            _ => {
                let soh = memchr(SOH, &rest[value_start..]).ok_or_else(|| {
                    WireError::MalformedField(format!("unterminated field {}", tag))
                })?;
                offset += value_start + soh + 1;
                &rest[value_start..value_start + soh]
            }
        };

        pending_length = match def {
            Some(d) if d.field_type == FieldType::Length => std::str::from_utf8(value)
                .ok()
                .and_then(|s| s.parse().ok()),
            _ => None,
        };

        tokens.push(RawField { tag, value });
    }

    Ok(tokens)
}

/// Walks header, message, and trailer declarations over the token stream
/// and concatenates the reconstructed entries.
fn descend(
    protocol: &Protocol,
    message: &Arc<Message>,
    tokens: &[RawField<'_>],
) -> Result<Payload, FixError> {
    let mut idx = 1; // MsgType was consumed by the caller

    let mut payload = walk(protocol.header(), tokens, &mut idx, false)?;
    for entry in walk(message.body(), tokens, &mut idx, false)? {
        payload.push(entry.0, entry.1);
    }
    for entry in walk(protocol.trailer(), tokens, &mut idx, false)? {
        payload.push(entry.0, entry.1);
    }

    if idx < tokens.len() {
        let tag = tokens[idx].tag;
        let mut known = protocol.header().tag_set();
        message.body().collect_tags(&mut known);
        protocol.trailer().collect_tags(&mut known);
        let err = if known.contains(&tag) {
            WireError::OutOfOrder {
                tag,
                context: message.name().to_string(),
            }
        } else {
            WireError::UnknownTag {
                tag,
                context: message.name().to_string(),
            }
        };
        return Err(err.into());
    }

    Ok(payload)
}

/// Consumes the tokens belonging to one declaration, in declared order.
///
/// In `in_repetition` mode a tag owned by an already-passed child ends the
/// walk (it opens the next repetition) instead of being an error.
fn walk(
    decl: &BaseComposite,
    tokens: &[RawField<'_>],
    idx: &mut usize,
    in_repetition: bool,
) -> Result<Payload, FixError> {
    let children = decl.children();
    let mut consumed = vec![false; children.len()];
    let mut next_child = 0usize;
    let mut payload = Payload::new();

    while *idx < tokens.len() {
        let token = &tokens[*idx];
        let Some(pos) = children.iter().position(|(c, _)| owns_tag(c, token.tag)) else {
            break;
        };

        if pos < next_child {
            if in_repetition {
                break;
            }
            let err: FixError = match &children[pos].0 {
                Composite::Field(f) if consumed[pos] => PayloadError::Duplicate {
                    name: f.name.clone(),
                    parent: decl.name().to_string(),
                }
                .into(),
                _ => WireError::OutOfOrder {
                    tag: token.tag,
                    context: decl.name().to_string(),
                }
                .into(),
            };
            return Err(err);
        }

        match &children[pos].0 {
            Composite::Field(field) => {
                let value = field.decode(token.value)?;
                payload.push(field.name.clone(), Value::Scalar(value));
                *idx += 1;
            }
            Composite::Component(component) => {
                let nested = walk(component.body(), tokens, idx, in_repetition)?;
                payload.push(component.name().to_string(), Value::Nested(nested));
            }
            Composite::Group(group) => {
                let repetitions = walk_group(group, tokens, idx)?;
                payload.push(group.name().to_string(), Value::Repeating(repetitions));
            }
        }
        consumed[pos] = true;
        next_child = pos + 1;
    }

    for (i, (child, required)) in children.iter().enumerate() {
        if *required && !consumed[i] {
            return Err(PayloadError::MissingRequired {
                name: child.name().to_string(),
                parent: decl.name().to_string(),
            }
            .into());
        }
    }

    Ok(payload)
}

/// Consumes a group's count field and its repetitions.
///
/// Greedy segmentation: a repetition ends when the delimiter tag reappears
/// or a tag outside the group's tag set is reached. The number of
/// repetitions found must equal the declared count.
fn walk_group(
    group: &Group,
    tokens: &[RawField<'_>],
    idx: &mut usize,
) -> Result<Vec<Payload>, FixError> {
    let declared = match group.count_field().decode(tokens[*idx].value)? {
        FieldValue::Int(n) if n >= 0 => n as usize,
        _ => {
            return Err(PayloadError::InvalidValue {
                field: group.count_field().name.clone(),
                reason: "repetition count is not a non-negative integer".to_string(),
            }
            .into())
        }
    };
    *idx += 1;

    let group_tags = group.body().tag_set();
    let mut delimiter_tags = HashSet::new();
    group.delimiter().collect_tags(&mut delimiter_tags);

    let mut repetitions = Vec::new();
    while *idx < tokens.len() {
        let tag = tokens[*idx].tag;
        if !group_tags.contains(&tag) {
            break;
        }
        if !delimiter_tags.contains(&tag) {
            return Err(WireError::OutOfOrder {
                tag,
                context: group.name().to_string(),
            }
            .into());
        }
        repetitions.push(walk(group.body(), tokens, idx, true)?);
    }

    if repetitions.len() != declared {
        return Err(WireError::CountMismatch {
            group: group.name().to_string(),
            declared,
            seen: repetitions.len(),
        }
        .into());
    }

    Ok(repetitions)
}

/// Returns true if a token with this tag belongs to the child.
///
/// A group is entered through its count field only; entries without a count
/// are rejected one level up.
fn owns_tag(child: &Composite, tag: u32) -> bool {
    match child {
        Composite::Field(f) => f.tag == tag,
        Composite::Component(c) => c.body().tag_set().contains(&tag),
        Composite::Group(g) => g.count_field().tag == tag,
    }
}

/// Parses a tag number: 1-9 ASCII digits.
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 9 {
        return None;
    }
    let mut tag: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        tag = tag.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(tag)
}

/// Parses a non-empty ASCII decimal as usize.
fn parse_decimal(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(usize::from(b - b'0'))?;
    }
    Some(n)
}
