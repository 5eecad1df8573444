use super::*;
use crate::codec::{Codec, CodecRegistry, Width};
use crate::config::{SlotWidth, ViewConfig};
use crate::error::{SchemaError, ViewError};
use crate::schema::{FieldDef, FieldType, Schema, SchemaCatalog};
use ntest::timeout;
use serde_json::Value;

fn registry() -> CodecRegistry {
    CodecRegistry::with_builtins().unwrap()
}

fn player_schema() -> Schema {
    Schema::new("player")
        .with_field("id", FieldType::scalar("u32"))
        .with_field("alive", FieldType::scalar("bool"))
        .with_field("nick", FieldType::text(10))
        .with_field("bio", FieldType::variable_text(100))
        .with_field("hp", FieldType::scalar("i16"))
        .with_field("tags", FieldType::list(FieldType::scalar("u16"), 4))
}

#[test]
#[timeout(1000)]
fn test_fixed_region_in_declaration_order() {
    let layout = compile(&player_schema(), &registry(), ViewConfig::default()).unwrap();

    let placed: Vec<(&str, usize, usize)> = layout
        .fields()
        .iter()
        .map(|f| (f.name.as_str(), f.offset, f.size))
        .collect();
    assert_eq!(
        placed,
        vec![
            ("id", 0, 4),
            ("alive", 4, 1),
            ("nick", 5, 11),
            ("bio", 16, 8),
            ("hp", 24, 2),
            ("tags", 26, 8),
        ]
    );
    assert_eq!(layout.fixed_size(), 34);
    assert!(!layout.is_fixed());
    assert_eq!(
        layout
            .variable_fields()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>(),
        vec!["bio", "tags"]
    );
    assert_eq!(layout.max_size(), 34 + 100 + 8);
}

#[test]
#[timeout(1000)]
fn test_compile_is_deterministic() {
    let registry = registry();
    let a = compile(&player_schema(), &registry, ViewConfig::default()).unwrap();
    let b = compile(&player_schema(), &registry, ViewConfig::default()).unwrap();
    assert_eq!(a, b);

    let narrow = ViewConfig {
        slot_width: SlotWidth::U16,
        ..ViewConfig::default()
    };
    let c = compile(&player_schema(), &registry, narrow).unwrap();
    assert_ne!(a, c);
    assert_eq!(c.field("bio").unwrap().size, 4);
}

#[test]
#[timeout(1000)]
fn test_size_formulas() {
    let layout = compile(&player_schema(), &registry(), ViewConfig::default()).unwrap();
    assert_eq!(layout.size_for(&[0, 0]), Ok(34));
    assert_eq!(layout.size_for(&[12, 6]), Ok(52));
    assert!(matches!(
        layout.size_for(&[101, 0]),
        Err(ViewError::Capacity { capacity: 100, .. })
    ));
    assert!(matches!(
        layout.size_for(&[1]),
        Err(ViewError::TypeMismatch { .. })
    ));
}

#[test]
#[timeout(1000)]
fn test_field_lookup() {
    let layout = compile(&player_schema(), &registry(), ViewConfig::default()).unwrap();
    assert_eq!(layout.field("hp").unwrap().offset, 24);
    assert_eq!(layout.field("hp").unwrap().end_offset(), 26);
    assert_eq!(layout.field_index("nick"), Some(2));
    assert_eq!(
        layout.field("mana"),
        Err(ViewError::FieldNotFound {
            layout: "player".to_string(),
            field: "mana".to_string()
        })
    );
}

#[test]
#[timeout(1000)]
fn test_nested_objects_and_arrays() {
    let mut catalog = SchemaCatalog::new();
    catalog
        .insert(
            Schema::new("vec2")
                .with_field("x", FieldType::scalar("f32"))
                .with_field("y", FieldType::scalar("f32")),
        )
        .unwrap();
    let body = Schema::new("body")
        .with_field("pos", FieldType::object("vec2"))
        .with_field("path", FieldType::array(FieldType::object("vec2"), 3))
        .with_field(
            "meta",
            FieldType::inline(vec![
                FieldDef::new("mass", FieldType::scalar("f64")),
                FieldDef::new("flags", FieldType::bits(&[("a", 3), ("b", 7)])),
            ]),
        );

    let registry = registry();
    let layout = Compiler::new(&registry, ViewConfig::default())
        .with_catalog(&catalog)
        .compile(&body)
        .unwrap();

    assert!(layout.is_fixed());
    assert_eq!(layout.field("pos").unwrap().size, 8);
    assert_eq!(layout.field("path").unwrap().size, 24);
    assert_eq!(layout.field("meta").unwrap().size, 10);
    assert_eq!(layout.fixed_size(), 42);

    match &layout.field("meta").unwrap().kind {
        FieldKind::Object(inner) => {
            assert_eq!(inner.name(), "meta");
            assert_eq!(inner.field("flags").unwrap().offset, 8);
        }
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
#[timeout(1000)]
fn test_compile_named() {
    let catalog = SchemaCatalog::from_json(
        r#"[{"name": "point", "fields": [{"name": "x", "type": "i32"}]}]"#,
    )
    .unwrap();
    let registry = registry();
    let compiler = Compiler::new(&registry, ViewConfig::default()).with_catalog(&catalog);
    assert_eq!(compiler.compile_named("point").unwrap().fixed_size(), 4);
    assert_eq!(
        compiler.compile_named("line"),
        Err(SchemaError::UnknownSchema {
            name: "line".to_string()
        })
    );
}

#[test]
#[timeout(1000)]
fn test_schema_errors() {
    let registry = registry();
    let config = ViewConfig::default();

    let duplicate = Schema::new("s")
        .with_field("a", FieldType::scalar("u8"))
        .with_field("a", FieldType::scalar("u16"));
    assert_eq!(
        compile(&duplicate, &registry, config),
        Err(SchemaError::DuplicateField {
            schema: "s".to_string(),
            field: "a".to_string()
        })
    );

    let unknown = Schema::new("s").with_field("a", FieldType::scalar("u128"));
    assert!(matches!(
        compile(&unknown, &registry, config),
        Err(SchemaError::UnknownKind { .. })
    ));

    let empty = Schema::new("s");
    assert!(matches!(
        compile(&empty, &registry, config),
        Err(SchemaError::EmptySchema { .. })
    ));

    let no_max = Schema::new("s").with_field(
        "t",
        FieldType::Scalar {
            kind: "text".to_string(),
            max_length: None,
            variable: false,
        },
    );
    assert!(matches!(
        compile(&no_max, &registry, config),
        Err(SchemaError::MissingParameter {
            parameter: "max_length",
            ..
        })
    ));

    let sized_int = Schema::new("s").with_field(
        "n",
        FieldType::Scalar {
            kind: "u8".to_string(),
            max_length: Some(4),
            variable: false,
        },
    );
    assert!(matches!(
        compile(&sized_int, &registry, config),
        Err(SchemaError::UnexpectedParameter { .. })
    ));

    let zero_text = Schema::new("s").with_field("t", FieldType::text(0));
    assert!(matches!(
        compile(&zero_text, &registry, config),
        Err(SchemaError::InvalidWidth { width: 0, .. })
    ));

    let zero_array = Schema::new("s").with_field("a", FieldType::array(FieldType::scalar("u8"), 0));
    assert!(matches!(
        compile(&zero_array, &registry, config),
        Err(SchemaError::InvalidWidth { width: 0, .. })
    ));

    let bad_bits = Schema::new("s").with_field("b", FieldType::bits(&[("x", 0)]));
    assert!(matches!(
        compile(&bad_bits, &registry, config),
        Err(SchemaError::InvalidBitWidth { .. })
    ));
}

#[test]
#[timeout(1000)]
fn test_nested_variable_rejected() {
    let registry = registry();
    let config = ViewConfig::default();

    let in_object = Schema::new("s").with_field(
        "o",
        FieldType::inline(vec![FieldDef::new("t", FieldType::variable_text(8))]),
    );
    assert_eq!(
        compile(&in_object, &registry, config),
        Err(SchemaError::NestedVariable {
            field: "t".to_string()
        })
    );

    let in_array = Schema::new("s").with_field(
        "a",
        FieldType::array(FieldType::list(FieldType::scalar("u8"), 2), 2),
    );
    assert!(matches!(
        compile(&in_array, &registry, config),
        Err(SchemaError::NestedVariable { .. })
    ));
}

#[test]
#[timeout(1000)]
fn test_recursive_reference_rejected() {
    let mut catalog = SchemaCatalog::new();
    catalog
        .insert(Schema::new("a").with_field("next", FieldType::object("b")))
        .unwrap();
    catalog
        .insert(Schema::new("b").with_field("back", FieldType::object("a")))
        .unwrap();

    let registry = registry();
    let result = Compiler::new(&registry, ViewConfig::default())
        .with_catalog(&catalog)
        .compile_named("a");
    assert_eq!(
        result,
        Err(SchemaError::RecursiveSchema {
            name: "a".to_string(),
            field: "back".to_string()
        })
    );
}

#[test]
#[timeout(1000)]
fn test_unresolved_reference() {
    let schema = Schema::new("s").with_field("o", FieldType::object("missing"));
    assert_eq!(
        compile(&schema, &registry(), ViewConfig::default()),
        Err(SchemaError::UnknownSchema {
            name: "missing".to_string()
        })
    );
}

#[test]
#[timeout(1000)]
fn test_slot_and_record_limits() {
    let registry = registry();
    let narrow = ViewConfig {
        slot_width: SlotWidth::U16,
        ..ViewConfig::default()
    };
    let schema = Schema::new("s")
        .with_field("a", FieldType::variable_text(40_000))
        .with_field("b", FieldType::variable_text(40_000));
    assert!(matches!(
        compile(&schema, &registry, narrow),
        Err(SchemaError::SlotOverflow { .. })
    ));
    assert!(compile(&schema, &registry, ViewConfig::default()).is_ok());

    let small = ViewConfig {
        max_record_size: 64,
        ..ViewConfig::default()
    };
    let big = Schema::new("s").with_field("a", FieldType::array(FieldType::scalar("u64"), 9));
    assert_eq!(
        compile(&big, &registry, small),
        Err(SchemaError::RecordTooLarge {
            schema: "s".to_string(),
            size: 72,
            limit: 64
        })
    );
}

#[test]
#[timeout(1000)]
fn test_custom_codec_needs_no_compiler_change() {
    let registry = registry();
    registry
        .register(Codec::new(
            "rgb",
            Width::Fixed(3),
            |region, _, _| {
                region.copy_from_slice(&[1, 2, 3]);
                Ok(3)
            },
            |region, _| Ok(Value::from(region.to_vec())),
        ))
        .unwrap();

    let schema = Schema::new("pixel")
        .with_field("color", FieldType::scalar("rgb"))
        .with_field("alpha", FieldType::scalar("u8"));
    let layout = compile(&schema, &registry, ViewConfig::default()).unwrap();
    assert_eq!(layout.fixed_size(), 4);
    assert_eq!(layout.field("alpha").unwrap().offset, 3);
}
