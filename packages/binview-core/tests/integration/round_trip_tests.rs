//! Plain value round trips through freshly allocated records.

use anyhow::Result;
use ntest::timeout;
use rand::Rng;
use serde_json::{json, Value};

use binview_core::codec::{primitive_codec, Primitive};
use binview_core::config::{OverflowPolicy, ViewConfig};
use binview_core::error::ViewError;
use binview_core::view::RecordBuf;

use super::helpers::{layout, layout_with};

fn entity_value() -> Value {
    json!({
        "id": 42u64,
        "label": "crate-7",
        "transform": {
            "position": {"x": 1.5, "y": -2.0, "z": 0.25},
            "scale": 2.0
        },
        "state": {"visible": 1, "layer": 17, "team": 5},
        "history": [
            {"x": 0.0, "y": 0.0, "z": 0.0},
            {"x": 1.0, "y": 1.0, "z": 1.0}
        ]
    })
}

fn message_value() -> Value {
    json!({
        "seq": 1001,
        "sender": "ops@example",
        "body": "disk usage above 90% on node ñ-3",
        "attachments": [1, 2, u64::MAX],
        "urgent": true
    })
}

#[timeout(1000)]
#[test]
fn test_fixed_entity_round_trip() -> Result<()> {
    let layout = layout("entity");
    assert!(layout.is_fixed());
    assert_eq!(layout.fixed_size(), 67);

    let record = RecordBuf::from_value(layout, &entity_value())?;
    assert_eq!(record.len(), 67);
    assert_eq!(record.to_json()?, entity_value());
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_variable_message_round_trip() -> Result<()> {
    let layout = layout("message");
    assert_eq!(layout.fixed_size(), 29);

    let value = message_value();
    let record = RecordBuf::from_value(layout, &value)?;
    let body_len = value["body"].as_str().map(str::len).unwrap_or_default();
    assert_eq!(record.len(), 29 + "ops@example".len() + body_len + 24);
    assert_eq!(record.to_json()?, value);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_round_trip_through_raw_bytes() -> Result<()> {
    let layout = layout("message");
    let bytes = RecordBuf::from_value(layout.clone(), &message_value())?.into_bytes();
    let restored = RecordBuf::from_bytes(layout, bytes)?;
    assert_eq!(restored.get("sender")?, json!("ops@example"));
    assert_eq!(restored.to_json()?, message_value());
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_empty_variable_members() -> Result<()> {
    let value = json!({
        "seq": 0,
        "sender": "",
        "body": "",
        "attachments": [],
        "urgent": false
    });
    let record = RecordBuf::from_value(layout("message"), &value)?;
    assert_eq!(record.len(), 29);
    assert_eq!(record.to_json()?, value);
    Ok(())
}

fn scalar_round_trip<T: Primitive + PartialEq + std::fmt::Debug>(value: T) {
    let codec = primitive_codec::<T>();
    let config = ViewConfig::default();
    let mut region = vec![0u8; T::SIZE];
    let plain = value.into_value();
    assert_eq!(codec.encode(&mut region, &plain, &config), Ok(T::SIZE));
    assert_eq!(codec.decode(&region, &config), Ok(plain));
    assert_eq!(T::read(&region, config.byte_order), value);
}

#[timeout(1000)]
#[test]
fn test_scalar_codecs_random_round_trip() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        scalar_round_trip(rng.gen::<u8>());
        scalar_round_trip(rng.gen::<u16>());
        scalar_round_trip(rng.gen::<u32>());
        scalar_round_trip(rng.gen::<u64>());
        scalar_round_trip(rng.gen::<i8>());
        scalar_round_trip(rng.gen::<i16>());
        scalar_round_trip(rng.gen::<i32>());
        scalar_round_trip(rng.gen::<i64>());
        scalar_round_trip(rng.gen_range(-1.0e30f32..1.0e30));
        scalar_round_trip(rng.gen_range(-1.0e300f64..1.0e300));
        scalar_round_trip(rng.gen::<bool>());
    }
}

#[timeout(1000)]
#[test]
fn test_text_overflow_leaves_buffer_unmodified() -> Result<()> {
    let mut record = RecordBuf::from_value(layout("entity"), &entity_value())?;
    let before = record.as_bytes().to_vec();

    let err = record
        .set("label", &json!("a label that is far too long"))
        .unwrap_err();
    assert!(matches!(err, ViewError::Capacity { ref field, capacity: 16, .. } if field == "label"));
    assert_eq!(record.as_bytes(), &before[..]);
    assert_eq!(record.get("label")?, json!("crate-7"));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_text_overflow_truncate_policy() -> Result<()> {
    let config = ViewConfig {
        text_overflow: OverflowPolicy::Truncate,
        ..ViewConfig::default()
    };
    let mut record = RecordBuf::from_value(layout_with("entity", config), &entity_value())?;
    record.set("label", &json!("exactly-sixteen!-and-more"))?;
    assert_eq!(record.get("label")?, json!("exactly-sixteen!"));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_out_of_range_scalar_rejected() -> Result<()> {
    let mut value = message_value();
    value["seq"] = json!(-1);
    assert!(matches!(
        RecordBuf::from_value(layout("message"), &value),
        Err(ViewError::Range { .. })
    ));

    let mut record = RecordBuf::from_value(layout("message"), &message_value())?;
    assert!(matches!(
        record.set("seq", &json!(1u64 << 40)),
        Err(ViewError::Range { .. })
    ));
    assert_eq!(record.get("seq")?, json!(1001));
    Ok(())
}
