use super::*;

fn user(sprite: u8, entity_id: u8, x: u16, y: u16) -> Entity {
    Entity::User { sprite, animation: 0, entity_id, width: 8, height: 12, x, y }
}

fn platform(x: u16, y: u16) -> Entity {
    Entity::Platform { sprite: 1, width: 50, height: 3, x, y }
}

fn bullet() -> Entity {
    Entity::Bullet { sprite: 4, origin_x: 10, origin_y: 20, end_x: 300, end_y: 255 }
}

// =============================================================
// Length table
// =============================================================

#[test]
fn record_lengths_match_wire_layout() {
    assert_eq!(EntityKind::User.record_len(), 10);
    assert_eq!(EntityKind::Platform.record_len(), 8);
    assert_eq!(EntityKind::Bullet.record_len(), 10);
}

#[test]
fn tags_round_trip_through_lookup() {
    for kind in EntityKind::ALL {
        assert_eq!(EntityKind::from_tag(kind.tag()), Some(kind));
    }
    assert_eq!(EntityKind::from_tag(2), None);
    assert_eq!(EntityKind::from_tag(255), None);
}

// =============================================================
// Decode scenarios
// =============================================================

#[test]
fn decodes_single_user_with_footer() {
    let bytes = [0x00, 0x01, 0x02, 0x03, 0x0A, 0x0A, 0x00, 0x14, 0x00, 0x1E, 0x07];
    let snapshot = decode_snapshot(&bytes).expect("decode");
    assert_eq!(snapshot.local_entity_id, 7);
    assert_eq!(
        snapshot.entities,
        vec![Entity::User { sprite: 1, animation: 2, entity_id: 3, width: 10, height: 10, x: 20, y: 30 }]
    );
}

#[test]
fn decodes_single_platform() {
    let bytes = [0x01, 0x00, 0x05, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00];
    let snapshot = decode_snapshot(&bytes).expect("decode");
    assert_eq!(snapshot.local_entity_id, 0);
    assert_eq!(snapshot.entities, vec![Entity::Platform { sprite: 0, width: 5, height: 5, x: 0, y: 0 }]);
}

#[test]
fn decodes_bullet_words_big_endian() {
    let bytes = [0x03, 0x04, 0x00, 0x0A, 0x00, 0x14, 0x01, 0x2C, 0x00, 0xFF, 0x09];
    let snapshot = decode_snapshot(&bytes).expect("decode");
    assert_eq!(snapshot.entities, vec![bullet()]);
    assert_eq!(snapshot.local_entity_id, 9);
}

#[test]
fn footer_only_message_is_empty_snapshot() {
    let snapshot = decode_snapshot(&[42]).expect("decode");
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.local_entity_id, 42);
}

#[test]
fn preserves_stream_order_across_kinds() {
    let entities = vec![platform(70, 245), user(0, 1, 5, 6), bullet(), platform(100, 220), user(3, 2, 7, 8)];
    let bytes = encode_snapshot(&Snapshot::new(entities.clone(), 1));
    let snapshot = decode_snapshot(&bytes).expect("decode");
    assert_eq!(snapshot.entities, entities);
}

#[test]
fn decoding_twice_yields_equal_snapshots() {
    let bytes = encode_snapshot(&Snapshot::new(vec![platform(1, 2), user(2, 5, 3, 4)], 5));
    let first = decode_snapshot(&bytes).expect("first");
    let second = decode_snapshot(&bytes).expect("second");
    assert_eq!(first, second);
}

#[test]
fn round_trip_preserves_extreme_field_values() {
    let entities = vec![
        Entity::User { sprite: 255, animation: 255, entity_id: 255, width: 255, height: 255, x: u16::MAX, y: u16::MAX },
        Entity::Platform { sprite: 0, width: 0, height: 0, x: 0, y: 0 },
        Entity::Bullet { sprite: 7, origin_x: u16::MAX, origin_y: 0, end_x: 0x0102, end_y: 0x8000 },
    ];
    let original = Snapshot::new(entities, 255);
    let decoded = decode_snapshot(&encode_snapshot(&original)).expect("decode");
    assert_eq!(decoded, original);
}

// =============================================================
// Malformed input
// =============================================================

#[test]
fn empty_message_is_rejected() {
    assert_eq!(decode_snapshot(&[]), Err(ProtocolError::Empty));
}

#[test]
fn unknown_tag_reports_offset() {
    let mut bytes = encode_snapshot(&Snapshot::new(vec![platform(0, 0)], 0));
    bytes.insert(8, 2);
    let err = decode_snapshot(&bytes).expect_err("tag 2 is unassigned");
    assert_eq!(err, ProtocolError::UnknownTag { tag: 2, offset: 8 });
}

#[test]
fn tag_without_body_is_truncated() {
    let err = decode_snapshot(&[0x00, 0x01]).expect_err("user tag alone");
    assert_eq!(
        err,
        ProtocolError::Truncated { kind: EntityKind::User, offset: 0, needed: 10, available: 1 }
    );
}

#[test]
fn record_straddling_footer_is_truncated() {
    // A platform whose last byte is the footer: 8 bytes total, so only 7 remain before it.
    let bytes = [0x01, 0x00, 0x05, 0x05, 0x00, 0x00, 0x00, 0x00];
    let err = decode_snapshot(&bytes).expect_err("straddles footer");
    assert_eq!(
        err,
        ProtocolError::Truncated { kind: EntityKind::Platform, offset: 0, needed: 8, available: 7 }
    );
}

#[test]
fn truncation_after_valid_records_reports_later_offset() {
    let mut bytes = encode_snapshot(&Snapshot::new(vec![platform(0, 0)], 3));
    bytes.pop();
    bytes.extend_from_slice(&[0x03, 0x00, 0x00, 3]);
    let err = decode_snapshot(&bytes).expect_err("bullet cut short");
    assert!(matches!(err, ProtocolError::Truncated { kind: EntityKind::Bullet, offset: 8, .. }));
}

// =============================================================
// Snapshot helpers
// =============================================================

#[test]
fn local_user_matches_footer_id() {
    let snapshot = Snapshot::new(vec![user(0, 1, 0, 0), user(1, 4, 9, 9), platform(0, 0)], 4);
    assert_eq!(snapshot.local_user(), Some(&user(1, 4, 9, 9)));
    assert!(!snapshot.is_local(&platform(0, 0)));
}

#[test]
fn local_user_absent_when_footer_names_nobody() {
    let snapshot = Snapshot::new(vec![user(0, 1, 0, 0)], 9);
    assert_eq!(snapshot.local_user(), None);
}

#[test]
fn count_groups_by_kind() {
    let snapshot = Snapshot::new(vec![platform(0, 0), platform(1, 1), bullet(), user(0, 0, 0, 0)], 0);
    assert_eq!(snapshot.count(EntityKind::Platform), 2);
    assert_eq!(snapshot.count(EntityKind::Bullet), 1);
    assert_eq!(snapshot.count(EntityKind::User), 1);
    assert_eq!(snapshot.len(), 4);
}

#[test]
fn entity_serializes_with_kind_tag() {
    let json = serde_json::to_value(platform(3, 4)).expect("serialize");
    assert_eq!(json["kind"], "platform");
    assert_eq!(json["x"], 3);
}

// =============================================================
// Properties
// =============================================================

/// Build an entity from raw field values; `selector` picks the kind.
fn entity_from((selector, a, b, c, d, x, y): (u8, u8, u8, u8, u8, u16, u16)) -> Entity {
    match selector % 3 {
        0 => Entity::User { sprite: a, animation: b, entity_id: c, width: d, height: a ^ d, x, y },
        1 => Entity::Platform { sprite: a, width: b, height: c, x, y },
        _ => Entity::Bullet {
            sprite: a,
            origin_x: x,
            origin_y: y,
            end_x: u16::from_be_bytes([b, c]),
            end_y: u16::from_be_bytes([d, a]),
        },
    }
}

#[quickcheck_macros::quickcheck]
fn decode_accepts_only_exact_encodings(bytes: Vec<u8>) -> bool {
    match decode_snapshot(&bytes) {
        Ok(snapshot) => encode_snapshot(&snapshot) == bytes,
        Err(_) => true,
    }
}

#[quickcheck_macros::quickcheck]
fn encode_then_decode_is_identity(fields: Vec<(u8, u8, u8, u8, u8, u16, u16)>, local: u8) -> bool {
    let snapshot = Snapshot::new(fields.into_iter().map(entity_from).collect(), local);
    decode_snapshot(&encode_snapshot(&snapshot)) == Ok(snapshot)
}

#[quickcheck_macros::quickcheck]
fn truncating_an_encoding_never_panics(fields: Vec<(u8, u8, u8, u8, u8, u16, u16)>, cut: usize) -> bool {
    let bytes = encode_snapshot(&Snapshot::new(fields.into_iter().map(entity_from).collect(), 0));
    let cut = cut % (bytes.len() + 1);
    match decode_snapshot(&bytes[..cut]) {
        Ok(snapshot) => encode_snapshot(&snapshot) == bytes[..cut],
        Err(_) => true,
    }
}
