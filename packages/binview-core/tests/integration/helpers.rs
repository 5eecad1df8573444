//! Shared fixtures for integration tests.

use std::sync::Arc;

use binview_core::codec::CodecRegistry;
use binview_core::config::ViewConfig;
use binview_core::layout::{Compiler, Layout};
use binview_core::schema::SchemaCatalog;

pub const CATALOG: &str = r#"[
    {
        "name": "vec3",
        "fields": [
            { "name": "x", "type": "f32" },
            { "name": "y", "type": "f32" },
            { "name": "z", "type": "f32" }
        ]
    },
    {
        "name": "entity",
        "fields": [
            { "name": "id", "type": "u64" },
            { "name": "label", "type": "text", "max_length": 16 },
            { "name": "transform", "type": "object", "fields": [
                { "name": "position", "type": "object", "schema": "vec3" },
                { "name": "scale", "type": "f32" }
            ] },
            { "name": "state", "type": "bits", "bits": [
                { "name": "visible", "bits": 1 },
                { "name": "layer", "bits": 5 },
                { "name": "team", "bits": 3 }
            ] },
            { "name": "history", "type": "array", "length": 2, "of": { "type": "object", "schema": "vec3" } }
        ]
    },
    {
        "name": "message",
        "fields": [
            { "name": "seq", "type": "u32" },
            { "name": "sender", "type": "text", "max_length": 32, "variable": true },
            { "name": "body", "type": "text", "max_length": 1024, "variable": true },
            { "name": "attachments", "type": "list", "max_length": 8, "of": { "type": "u64" } },
            { "name": "urgent", "type": "bool" }
        ]
    }
]"#;

pub fn catalog() -> SchemaCatalog {
    SchemaCatalog::from_json(CATALOG).unwrap()
}

pub fn registry() -> CodecRegistry {
    CodecRegistry::with_builtins().unwrap()
}

/// Compiles a schema from the shared catalog with the default configuration.
pub fn layout(name: &str) -> Arc<Layout> {
    layout_with(name, ViewConfig::default())
}

pub fn layout_with(name: &str, config: ViewConfig) -> Arc<Layout> {
    let catalog = catalog();
    let registry = registry();
    let layout = Compiler::new(&registry, config)
        .with_catalog(&catalog)
        .compile_named(name)
        .unwrap();
    Arc::new(layout)
}
