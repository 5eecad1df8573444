//! Schema documents, catalogs and custom codecs end to end.

use std::sync::Arc;

use anyhow::Result;
use ntest::timeout;
use serde_json::{json, Value};

use binview_core::codec::{Codec, Width};
use binview_core::config::{ByteOrder, SlotWidth, ViewConfig};
use binview_core::error::{SchemaError, ViewError};
use binview_core::layout::Compiler;
use binview_core::schema::{Schema, SchemaCatalog};
use binview_core::view::{FieldView, RecordBuf};

use super::helpers::{catalog, layout, registry};

fn rgb_codec() -> Codec {
    Codec::new(
        "rgb",
        Width::Fixed(3),
        |region, value, _| {
            let text = value.as_str().unwrap_or_default();
            let hex = text.strip_prefix('#').unwrap_or(text);
            let parsed = u32::from_str_radix(hex, 16).ok().filter(|_| hex.len() == 6);
            let Some(rgb) = parsed else {
                return Err(ViewError::Range {
                    kind: "rgb".to_string(),
                    value: value.to_string(),
                });
            };
            region.copy_from_slice(&rgb.to_be_bytes()[1..]);
            Ok(3)
        },
        |region, _| {
            Ok(Value::from(format!(
                "#{:02x}{:02x}{:02x}",
                region[0], region[1], region[2]
            )))
        },
    )
}

fn ascii_codec() -> Codec {
    Codec::new(
        "ascii",
        Width::Bounded,
        |region, value, _| {
            let text = value.as_str().unwrap_or_default();
            if !text.is_ascii() {
                return Err(ViewError::Range {
                    kind: "ascii".to_string(),
                    value: value.to_string(),
                });
            }
            if text.len() > region.len() {
                return Err(ViewError::Capacity {
                    field: String::new(),
                    required: text.len(),
                    capacity: region.len(),
                });
            }
            region[..text.len()].copy_from_slice(text.as_bytes());
            Ok(text.len())
        },
        |region, _| {
            std::str::from_utf8(region)
                .map(Value::from)
                .map_err(|e| ViewError::Decode {
                    offset: e.valid_up_to(),
                    reason: "not ascii".to_string(),
                })
        },
    )
}

#[timeout(1000)]
#[test]
fn test_catalog_document_loads_every_schema() -> Result<()> {
    let catalog = catalog();
    assert_eq!(catalog.len(), 3);
    assert_eq!(
        catalog.names().collect::<Vec<_>>(),
        vec!["entity", "message", "vec3"]
    );

    let registry = registry();
    let compiler = Compiler::new(&registry, ViewConfig::default()).with_catalog(&catalog);
    for name in ["vec3", "entity", "message"] {
        let layout = compiler.compile_named(name)?;
        assert_eq!(layout.name(), name);
    }
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_custom_codecs_through_registry() -> Result<()> {
    let registry = registry();
    registry.register(rgb_codec())?;
    registry.register(ascii_codec())?;

    let schema = Schema::from_json(
        r#"{
            "name": "swatch",
            "fields": [
                { "name": "color", "type": "rgb" },
                { "name": "code", "type": "ascii", "max_length": 8 },
                { "name": "note", "type": "ascii", "max_length": 64, "variable": true }
            ]
        }"#,
    )?;
    let layout = Arc::new(Compiler::new(&registry, ViewConfig::default()).compile(&schema)?);
    assert_eq!(layout.field("color")?.size, 3);
    assert_eq!(layout.variable_count(), 1);

    let value = json!({"color": "#ff8000", "code": "ORNG", "note": "safety orange"});
    let mut record = RecordBuf::from_value(layout, &value)?;
    assert_eq!(&record.as_bytes()[..3], &[0xff, 0x80, 0x00]);
    assert_eq!(record.to_json()?, value);

    assert!(matches!(
        record.set("color", &json!("orange")),
        Err(ViewError::Range { .. })
    ));
    assert!(matches!(
        record.set("code", &json!("TOO-LONG-CODE")),
        Err(ViewError::Capacity { ref field, capacity: 8, .. }) if field == "code"
    ));
    assert!(matches!(
        record.set("code", &json!("naïve")),
        Err(ViewError::Range { .. })
    ));
    record.set("code", &json!("AMBR"))?;
    assert_eq!(record.get("code")?, json!("AMBR"));
    assert_eq!(record.get("color")?, json!("#ff8000"));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_unregistered_codec_is_rejected() {
    let registry = registry();
    let schema = Schema::from_json(
        r#"{ "name": "swatch", "fields": [ { "name": "color", "type": "rgb" } ] }"#,
    )
    .unwrap();
    let result = Compiler::new(&registry, ViewConfig::default()).compile(&schema);
    assert!(matches!(
        result,
        Err(SchemaError::UnknownKind { ref field, ref kind }) if field == "color" && kind == "rgb"
    ));
}

#[timeout(1000)]
#[test]
fn test_catalog_reference_errors() {
    let catalog = SchemaCatalog::from_json(
        r#"[
            { "name": "node", "fields": [
                { "name": "value", "type": "u32" },
                { "name": "next", "type": "object", "schema": "link" }
            ] },
            { "name": "link", "fields": [
                { "name": "target", "type": "object", "schema": "node" }
            ] },
            { "name": "orphan", "fields": [
                { "name": "parent", "type": "object", "schema": "missing" }
            ] }
        ]"#,
    )
    .unwrap();
    let registry = registry();
    let compiler = Compiler::new(&registry, ViewConfig::default()).with_catalog(&catalog);

    assert!(matches!(
        compiler.compile_named("node"),
        Err(SchemaError::RecursiveSchema { .. })
    ));
    assert!(matches!(
        compiler.compile_named("orphan"),
        Err(SchemaError::UnknownSchema { ref name }) if name == "missing"
    ));
    assert!(matches!(
        compiler.compile_named("absent"),
        Err(SchemaError::UnknownSchema { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_duplicate_schema_in_document() {
    let result = SchemaCatalog::from_json(
        r#"[
            { "name": "a", "fields": [ { "name": "x", "type": "u8" } ] },
            { "name": "a", "fields": [ { "name": "y", "type": "u8" } ] }
        ]"#,
    );
    assert!(matches!(
        result,
        Err(SchemaError::DuplicateSchema { ref name }) if name == "a"
    ));
}

#[timeout(1000)]
#[test]
fn test_config_document_drives_layout() -> Result<()> {
    let config: ViewConfig =
        serde_json::from_str(r#"{ "byte_order": "big", "slot_width": "u16" }"#)?;
    assert_eq!(config.byte_order, ByteOrder::Big);
    assert_eq!(config.slot_width, SlotWidth::U16);
    assert_eq!(config.max_record_size, ViewConfig::default().max_record_size);

    let catalog = catalog();
    let registry = registry();
    let layout = Compiler::new(&registry, config)
        .with_catalog(&catalog)
        .compile_named("message")?;
    // seq, three 4-byte slots, urgent
    assert_eq!(layout.fixed_size(), 4 + 3 * 4 + 1);
    assert_eq!(layout.config(), &config);

    let value = json!({
        "seq": 0x0102_0304u32,
        "sender": "a",
        "body": "b",
        "attachments": [],
        "urgent": false
    });
    let record = RecordBuf::from_value(Arc::new(layout), &value)?;
    assert_eq!(&record.as_bytes()[..4], &[1, 2, 3, 4]);
    assert_eq!(record.to_json()?, value);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_schema_document_round_trips() -> Result<()> {
    let catalog = catalog();
    let entity = catalog
        .get("entity")
        .ok_or_else(|| anyhow::anyhow!("entity missing"))?;
    let restored = Schema::from_json(&entity.to_json()?)?;
    assert_eq!(&restored, entity);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_text_field_as_byte_string() -> Result<()> {
    let value = json!({
        "seq": 7,
        "sender": "zoë",
        "body": "héllo wörld",
        "attachments": [9],
        "urgent": true
    });
    let record = RecordBuf::from_value(layout("message"), &value)?;
    let view = record.view();

    let FieldView::Text(body) = view.get_view("body")? else {
        anyhow::bail!("body is not a text view");
    };
    assert!(body.is_borrowed());
    assert_eq!(body.len(), 13);
    assert_eq!(body.size(), 11);
    assert_eq!(body.search("wörld".as_bytes(), 0), Some(7));
    assert_eq!(body.substring(0, 3)?.to_text()?, "hé");
    assert!(matches!(body.substring(0, 2), Err(ViewError::Decode { offset: 2, .. })));

    let mut reversed = body.clone().into_owned();
    reversed.reverse()?;
    assert_eq!(reversed.to_text()?, "dlröw olléh");
    assert_eq!(view.get("body")?, json!("héllo wörld"));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_bits_field_matches_after_update() -> Result<()> {
    let entity = layout("entity");
    let mut record = RecordBuf::zeroed(entity);
    {
        let mut view = record.view_mut();
        view.update_bits("state", |bits| {
            bits.set("visible", 1)?.set("team", 4)?;
            Ok(())
        })?;
    }

    let state = record.view().bits("state")?;
    let schema = state.schema();
    let red_team = schema.matcher(&[("visible", 1), ("team", 4)])?;
    let blue_team = schema.matcher(&[("team", 2)])?;
    assert!(state.matches(&red_team));
    assert!(!state.matches(&blue_team));
    assert_eq!(
        record.get("state")?,
        json!({"visible": 1, "layer": 0, "team": 4})
    );
    Ok(())
}
