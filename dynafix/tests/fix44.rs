/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! End-to-end scenarios against the bundled FIX 4.4 definition.

use dynafix::prelude::*;
use dynafix::tagvalue::{checksum_of, read_checksum};
use rust_decimal::Decimal;

fn fix44() -> Protocol {
    Protocol::load("fix44").expect("bundled FIX 4.4 definition")
}

/// Logon payload in canonical (declared) order, with the value types the
/// parser reconstructs.
fn logon_payload() -> Payload {
    Payload::new()
        .with("SenderCompID", "CLIENT1")
        .with("TargetCompID", "BROKER")
        .with("MsgSeqNum", 1i64)
        .with("SendingTime", "20090107-18:15:16")
        .with("EncryptMethod", "0")
        .with("HeartBtInt", 30i64)
}

fn order_payload() -> Payload {
    Payload::new()
        .with("SenderCompID", "CLIENT1")
        .with("TargetCompID", "BROKER")
        .with("MsgSeqNum", 2i64)
        .with("SendingTime", "20090107-18:15:17")
        .with("ClOrdID", "ORD-1001")
        .with_group(
            "NoAllocs",
            vec![
                Payload::new()
                    .with("AllocAccount", "A1")
                    .with("AllocQty", Decimal::from(50)),
                Payload::new()
                    .with("AllocAccount", "A2")
                    .with("AllocQty", Decimal::from(50)),
            ],
        )
        .with_component("Instrument", Payload::new().with("Symbol", "EUR/USD"))
        .with("Side", "1")
        .with("TransactTime", "20090107-18:15:17")
        .with_component(
            "OrderQtyData",
            Payload::new().with("OrderQty", Decimal::from(100)),
        )
        .with("OrdType", "2")
        .with("Price", Decimal::new(10825, 4))
}

#[test]
fn serialized_logon_has_correct_envelope() {
    let protocol = fix44();
    let bytes = serialize(&protocol, "Logon", &logon_payload()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.starts_with("8=FIX.4.4\x019="));
    assert!(text.contains("\x0135=A\x01"));
    assert!(text.contains("49=CLIENT1\x01"));
    assert!(text.contains("56=BROKER\x01"));
    assert!(text.contains("34=1\x01"));
    assert!(text.contains("52=20090107-18:15:16\x01"));
    assert!(text.contains("98=0\x01"));
    assert!(text.contains("108=30\x01"));

    // CheckSum is the mod-256 byte sum of everything before "10=".
    let trailer_at = text.rfind("10=").unwrap();
    let declared = read_checksum(&bytes[trailer_at + 3..trailer_at + 6]).unwrap();
    assert_eq!(declared, checksum_of(&bytes[..trailer_at]));
    assert_eq!(bytes.last(), Some(&0x01));
}

#[test]
fn parse_recovers_the_logon_payload() {
    let protocol = fix44();
    let payload = logon_payload();
    let bytes = serialize(&protocol, "Logon", &payload).unwrap();
    let parsed = parse(&protocol, &bytes).unwrap();

    assert_eq!(parsed.message.name(), "Logon");
    assert_eq!(parsed.consumed, bytes.len());
    assert_eq!(parsed.payload, payload);
}

#[test]
fn serialize_parse_serialize_is_idempotent() {
    let protocol = fix44();
    let bytes = serialize(&protocol, "NewOrderSingle", &order_payload()).unwrap();
    let parsed = parse(&protocol, &bytes).unwrap();
    let again = serialize(&protocol, "NewOrderSingle", &parsed.payload).unwrap();
    assert_eq!(bytes, again);
}

#[test]
fn truncated_message_needs_more_and_consumes_nothing() {
    let protocol = fix44();
    let bytes = serialize(&protocol, "Logon", &logon_payload()).unwrap();

    let err = parse(&protocol, &bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err, FixError::Wire(WireError::NeedMore));
}

#[test]
fn mutated_checksum_is_rejected() {
    let protocol = fix44();
    let bytes = serialize(&protocol, "Logon", &logon_payload()).unwrap();

    let mut corrupted = bytes.to_vec();
    let digits_at = corrupted.len() - 4;
    let declared = read_checksum(&corrupted[digits_at..digits_at + 3]).unwrap();
    corrupted[digits_at..digits_at + 3]
        .copy_from_slice(&dynafix::tagvalue::render_checksum(declared.wrapping_add(1)));

    assert!(matches!(
        parse(&protocol, &corrupted).unwrap_err(),
        FixError::Wire(WireError::ChecksumMismatch { .. })
    ));
}

#[test]
fn group_count_precedes_delimiter_and_counts_repetitions() {
    let protocol = fix44();
    let bytes = serialize(&protocol, "NewOrderSingle", &order_payload()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    let count_tag = protocol.field_by_name("NoAllocs").unwrap().tag;
    let count_field = format!("{}=2\x01", count_tag);
    let count_at = text.find(&count_field).expect("group count on the wire");
    let first_delimiter = text.find("79=A1").expect("first repetition");
    assert!(count_at < first_delimiter);
    assert_eq!(text.matches("\x0179=").count(), 2);

    let parsed = parse(&protocol, &bytes).unwrap();
    let allocs = parsed
        .payload
        .get("NoAllocs")
        .and_then(Value::as_repeating)
        .unwrap();
    assert_eq!(allocs.len(), 2);
}

#[test]
fn enum_fields_accept_token_and_description() {
    let protocol = fix44();

    let with_description = Payload::new()
        .with("SenderCompID", "CLIENT1")
        .with("TargetCompID", "BROKER")
        .with("MsgSeqNum", 1i64)
        .with("SendingTime", "20090107-18:15:16")
        .with("EncryptMethod", "NONE_OTHER")
        .with("HeartBtInt", 30i64);
    let bytes = serialize(&protocol, "Logon", &with_description).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("98=0\x01"));

    let outside_enum = Payload::new()
        .with("SenderCompID", "CLIENT1")
        .with("TargetCompID", "BROKER")
        .with("MsgSeqNum", 1i64)
        .with("SendingTime", "20090107-18:15:16")
        .with("EncryptMethod", "42")
        .with("HeartBtInt", 30i64);
    assert!(matches!(
        serialize(&protocol, "Logon", &outside_enum).unwrap_err(),
        PayloadError::InvalidValue { ref field, .. } if field == "EncryptMethod"
    ));
}

#[test]
fn managed_fields_are_refused_in_payloads() {
    let protocol = fix44();
    for managed in ["BeginString", "BodyLength", "MsgType", "CheckSum"] {
        let payload = logon_payload().with(managed, "anything");
        assert_eq!(
            serialize(&protocol, "Logon", &payload).unwrap_err(),
            PayloadError::ManagedConflict(managed.to_string()),
            "{} must be refused",
            managed
        );
    }
}

#[test]
fn extension_with_mismatched_version_is_rejected() {
    let mut protocol = fix44();
    let foreign = r#"
<fix type="FIX" major="4" minor="2">
  <messages>
    <message name="PingRequest" msgtype="U1" msgcat="app">
      <field name="PingID" required="Y"/>
    </message>
  </messages>
  <fields>
    <field number="5001" name="PingID" type="STRING"/>
  </fields>
</fix>"#;

    assert_eq!(
        protocol.extend(foreign).unwrap_err(),
        SchemaError::ProtocolMismatch {
            expected: "FIX.4.4".to_string(),
            got: "FIX.4.2".to_string(),
        }
    );
    // The base lookups are untouched.
    assert!(protocol.field_by_name("PingID").is_none());
    assert!(protocol.message_by_name("PingRequest").is_none());
}

#[test]
fn extension_messages_serialize_and_parse() {
    let mut protocol = fix44();
    let extension = r#"
<fix type="FIX" major="4" minor="4">
  <messages>
    <message name="PingRequest" msgtype="U1" msgcat="app">
      <field name="PingID" required="Y"/>
    </message>
  </messages>
  <fields>
    <field number="5001" name="PingID" type="STRING"/>
  </fields>
</fix>"#;
    protocol.extend(extension).unwrap();

    let payload = Payload::new()
        .with("SenderCompID", "CLIENT1")
        .with("TargetCompID", "BROKER")
        .with("MsgSeqNum", 9i64)
        .with("SendingTime", "20090107-18:15:30")
        .with("PingID", "PING-1");

    let bytes = serialize(&protocol, "PingRequest", &payload).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("\x0135=U1\x01"));

    let parsed = parse(&protocol, &bytes).unwrap();
    assert_eq!(parsed.message.name(), "PingRequest");
    assert_eq!(
        parsed.payload.get_scalar("PingID"),
        Some(&FieldValue::String("PING-1".to_string()))
    );

    // Base definitions remain resolvable after the overlay.
    assert!(protocol.message_by_name("Logon").is_some());
    assert!(protocol.field_by_name("HeartBtInt").is_some());
}

#[test]
fn nested_group_in_component_round_trips() {
    let protocol = fix44();
    let payload = Payload::new()
        .with("SenderCompID", "CLIENT1")
        .with("TargetCompID", "BROKER")
        .with("MsgSeqNum", 3i64)
        .with("SendingTime", "20090107-18:15:18")
        .with("ClOrdID", "ORD-1002")
        .with_component(
            "Parties",
            Payload::new().with_group(
                "NoPartyIDs",
                vec![Payload::new()
                    .with("PartyID", "DESK-7")
                    .with("PartyRole", 11i64)
                    .with_component(
                        "PtysSubGrp",
                        Payload::new().with_group(
                            "NoPartySubIDs",
                            vec![Payload::new()
                                .with("PartySubID", "TRADER-9")
                                .with("PartySubIDType", 2i64)],
                        ),
                    )],
            ),
        )
        .with_component("Instrument", Payload::new().with("Symbol", "EUR/USD"))
        .with("Side", "2")
        .with("TransactTime", "20090107-18:15:18")
        .with_component(
            "OrderQtyData",
            Payload::new().with("OrderQty", Decimal::from(25)),
        )
        .with("OrdType", "1");

    let bytes = serialize(&protocol, "NewOrderSingle", &payload).unwrap();
    let parsed = parse(&protocol, &bytes).unwrap();

    let parties = parsed
        .payload
        .get("Parties")
        .and_then(Value::as_nested)
        .expect("Parties component");
    let party_ids = parties
        .get("NoPartyIDs")
        .and_then(Value::as_repeating)
        .expect("NoPartyIDs group");
    assert_eq!(party_ids.len(), 1);

    let subs = party_ids[0]
        .get("PtysSubGrp")
        .and_then(Value::as_nested)
        .and_then(|p| p.get("NoPartySubIDs"))
        .and_then(Value::as_repeating)
        .expect("nested sub-id group");
    assert_eq!(
        subs[0].get_scalar("PartySubID"),
        Some(&FieldValue::String("TRADER-9".to_string()))
    );

    // PartyRole is an enum INT: the parser returns the raw token.
    assert_eq!(
        party_ids[0].get_scalar("PartyRole"),
        Some(&FieldValue::String("11".to_string()))
    );
}

#[test]
fn duplicate_field_on_the_wire_is_rejected() {
    let protocol = fix44();
    let bytes = serialize(&protocol, "Logon", &logon_payload()).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    let doubled = text.replace("108=30\x01", "108=30\x01108=30\x01");

    // Reframe and re-checksum so only the duplication is at fault.
    let body_start = doubled.find("35=").unwrap();
    let trailer_start = doubled.rfind("10=").unwrap();
    let body = &doubled[body_start..trailer_start];
    let mut msg = format!("8=FIX.4.4\x019={}\x01{}", body.len(), body).into_bytes();
    let checksum = checksum_of(&msg);
    msg.extend_from_slice(b"10=");
    msg.extend_from_slice(&dynafix::tagvalue::render_checksum(checksum));
    msg.push(0x01);

    assert!(matches!(
        parse(&protocol, &msg).unwrap_err(),
        FixError::Payload(PayloadError::Duplicate { ref name, .. }) if name == "HeartBtInt"
    ));
}

#[test]
fn signature_trailer_fields_round_trip() {
    let protocol = fix44();
    let signature = bytes::Bytes::from_static(b"sig\x01ned");
    let payload = logon_payload()
        .with("SignatureLength", 7i64)
        .with("Signature", signature.clone());

    let bytes = serialize(&protocol, "Logon", &payload).unwrap();
    let parsed = parse(&protocol, &bytes).unwrap();
    assert_eq!(
        parsed.payload.get_scalar("Signature"),
        Some(&FieldValue::Data(signature))
    );
}
