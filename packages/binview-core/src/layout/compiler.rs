//! Schema to layout compilation.

use std::collections::HashSet;
use std::sync::Arc;

use super::descriptor::Layout;
use super::field::{prefix_width, FieldKind, FieldLayout};
use crate::bits::BitSchema;
use crate::codec::{CodecRegistry, Width};
use crate::config::ViewConfig;
use crate::error::SchemaError;
use crate::schema::{FieldDef, FieldType, ObjectRef, Schema, SchemaCatalog};

/// Compiles a schema into a layout.
///
/// Pure and deterministic: compiling the same schema with the same registry
/// contents and configuration always yields equal layouts.
///
/// # Arguments
/// * `schema` - Schema to compile
/// * `registry` - Codecs for scalar kinds
/// * `config` - Byte order, slot width and size limits
///
/// # Returns
/// `Result<Layout, SchemaError>` containing the compiled layout.
pub fn compile(
    schema: &Schema,
    registry: &CodecRegistry,
    config: ViewConfig,
) -> Result<Layout, SchemaError> {
    Compiler::new(registry, config).compile(schema)
}

/// Layout compiler with optional by-name schema resolution.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r CodecRegistry,
    catalog: Option<&'r SchemaCatalog>,
    config: ViewConfig,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r CodecRegistry, config: ViewConfig) -> Self {
        Self {
            registry,
            catalog: None,
            config,
        }
    }

    /// Resolves `object` fields that reference schemas by name through `catalog`.
    pub fn with_catalog(mut self, catalog: &'r SchemaCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Compiles a schema.
    pub fn compile(&self, schema: &Schema) -> Result<Layout, SchemaError> {
        let mut stack = vec![schema.name.clone()];
        let layout = self.compile_object(&schema.name, &schema.fields, true, &mut stack)?;

        tracing::debug!(
            schema = %schema.name,
            fields = layout.fields().len(),
            fixed_size = layout.fixed_size(),
            max_size = layout.max_size(),
            variable = layout.variable_count(),
            "compiled layout"
        );
        Ok(layout)
    }

    /// Compiles a schema from the catalog by name.
    pub fn compile_named(&self, name: &str) -> Result<Layout, SchemaError> {
        let schema = self.lookup(name)?;
        self.compile(schema)
    }

    fn lookup(&self, name: &str) -> Result<&'r Schema, SchemaError> {
        self.catalog
            .and_then(|catalog| catalog.get(name))
            .ok_or_else(|| SchemaError::UnknownSchema {
                name: name.to_string(),
            })
    }

    fn compile_object(
        &self,
        name: &str,
        defs: &[FieldDef],
        top_level: bool,
        stack: &mut Vec<String>,
    ) -> Result<Layout, SchemaError> {
        if defs.is_empty() {
            return Err(SchemaError::EmptySchema {
                name: name.to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(defs.len());
        let mut fields = Vec::with_capacity(defs.len());
        let mut offset = 0usize;

        for def in defs {
            if !seen.insert(def.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    schema: name.to_string(),
                    field: def.name.clone(),
                });
            }

            let (kind, size) = self.resolve(&def.name, &def.ty, top_level, stack)?;
            let size = if kind.is_variable() {
                self.config.slot_width.slot_size()
            } else {
                size
            };
            if size == 0 {
                return Err(SchemaError::InvalidWidth {
                    field: def.name.clone(),
                    width: 0,
                });
            }

            tracing::trace!(schema = %name, field = %def.name, offset, size, "placed field");
            fields.push(FieldLayout {
                name: def.name.clone(),
                offset,
                size,
                kind,
            });
            offset = offset
                .checked_add(size)
                .ok_or(SchemaError::CapacityOverflow {
                    operation: "field offset calculation",
                })?;
        }

        Layout::build(name, fields, self.config)
    }

    /// Resolves a declared type to a field kind and its fixed-region width.
    fn resolve(
        &self,
        field: &str,
        ty: &FieldType,
        top_level: bool,
        stack: &mut Vec<String>,
    ) -> Result<(FieldKind, usize), SchemaError> {
        match ty {
            FieldType::Scalar {
                kind,
                max_length,
                variable,
            } => {
                let codec = self
                    .registry
                    .get(kind)
                    .ok_or_else(|| SchemaError::UnknownKind {
                        field: field.to_string(),
                        kind: kind.clone(),
                    })?;

                match codec.width {
                    Width::Fixed(size) => {
                        if max_length.is_some() {
                            return Err(SchemaError::UnexpectedParameter {
                                field: field.to_string(),
                                parameter: "max_length",
                            });
                        }
                        if *variable {
                            return Err(SchemaError::UnexpectedParameter {
                                field: field.to_string(),
                                parameter: "variable",
                            });
                        }
                        Ok((FieldKind::Scalar(codec), size))
                    }
                    Width::Bounded => {
                        let max_length = max_length.ok_or_else(|| SchemaError::MissingParameter {
                            field: field.to_string(),
                            parameter: "max_length",
                        })?;
                        if max_length == 0 {
                            return Err(SchemaError::InvalidWidth {
                                field: field.to_string(),
                                width: 0,
                            });
                        }

                        if *variable {
                            if !top_level {
                                return Err(SchemaError::NestedVariable {
                                    field: field.to_string(),
                                });
                            }
                            return Ok((FieldKind::VarBounded { codec, max_length }, 0));
                        }

                        if max_length > u32::MAX as usize {
                            return Err(SchemaError::InvalidWidth {
                                field: field.to_string(),
                                width: max_length,
                            });
                        }
                        let prefix = prefix_width(max_length);
                        let size = max_length
                            .checked_add(prefix)
                            .ok_or(SchemaError::CapacityOverflow {
                                operation: "bounded field size calculation",
                            })?;
                        Ok((
                            FieldKind::Bounded {
                                codec,
                                max_length,
                                prefix,
                            },
                            size,
                        ))
                    }
                }
            }
            FieldType::Object(ObjectRef::Named(name)) => {
                if stack.iter().any(|s| s == name) {
                    return Err(SchemaError::RecursiveSchema {
                        name: name.clone(),
                        field: field.to_string(),
                    });
                }
                let schema = self.lookup(name)?;

                stack.push(name.clone());
                let layout = self.compile_object(name, &schema.fields, false, stack);
                stack.pop();

                let layout = layout?;
                let size = layout.fixed_size();
                Ok((FieldKind::Object(Arc::new(layout)), size))
            }
            FieldType::Object(ObjectRef::Inline(defs)) => {
                let layout = self.compile_object(field, defs, false, stack)?;
                let size = layout.fixed_size();
                Ok((FieldKind::Object(Arc::new(layout)), size))
            }
            FieldType::Array { of, length } => {
                if *length == 0 {
                    return Err(SchemaError::InvalidWidth {
                        field: field.to_string(),
                        width: 0,
                    });
                }
                let (element, element_size) = self.resolve(field, of, false, stack)?;
                let size =
                    element_size
                        .checked_mul(*length)
                        .ok_or(SchemaError::CapacityOverflow {
                            operation: "array size calculation",
                        })?;
                Ok((
                    FieldKind::Array {
                        element: Box::new(element),
                        element_size,
                        length: *length,
                    },
                    size,
                ))
            }
            FieldType::List { of, max_length } => {
                if !top_level {
                    return Err(SchemaError::NestedVariable {
                        field: field.to_string(),
                    });
                }
                if *max_length == 0 {
                    return Err(SchemaError::InvalidWidth {
                        field: field.to_string(),
                        width: 0,
                    });
                }
                let (element, element_size) = self.resolve(field, of, false, stack)?;
                element_size
                    .checked_mul(*max_length)
                    .ok_or(SchemaError::CapacityOverflow {
                        operation: "list size calculation",
                    })?;
                Ok((
                    FieldKind::List {
                        element: Box::new(element),
                        element_size,
                        max_length: *max_length,
                    },
                    0,
                ))
            }
            FieldType::Bits(defs) => {
                let schema = BitSchema::new(defs)?;
                let size = schema.byte_len();
                Ok((FieldKind::Bits(Arc::new(schema)), size))
            }
        }
    }
}
