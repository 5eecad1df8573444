//! JSON document form of field definitions.
//!
//! ```json
//! { "name": "tags", "type": "list", "max_length": 8, "of": { "type": "u16" } }
//! ```

use serde::{Deserialize, Serialize};

use super::types::{BitFieldDef, FieldDef, FieldType, ObjectRef};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    /// Empty for array/list element types
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    variable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    of: Option<Box<RawField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<RawField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bits: Option<Vec<BitFieldDef>>,
}

fn required<T>(value: Option<T>, field: &str, parameter: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("field '{}' is missing '{}'", field, parameter))
}

fn into_type(raw: RawField) -> Result<FieldType, String> {
    let name = raw.name;
    match raw.kind.as_str() {
        "object" => match (raw.schema, raw.fields) {
            (Some(schema), None) => Ok(FieldType::Object(ObjectRef::Named(schema))),
            (None, Some(fields)) => {
                let fields = fields
                    .into_iter()
                    .map(FieldDef::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldType::Object(ObjectRef::Inline(fields)))
            }
            _ => Err(format!(
                "object field '{}' needs exactly one of 'schema' or 'fields'",
                name
            )),
        },
        "array" => Ok(FieldType::Array {
            of: Box::new(into_type(*required(raw.of, &name, "of")?)?),
            length: required(raw.length, &name, "length")?,
        }),
        "list" => Ok(FieldType::List {
            of: Box::new(into_type(*required(raw.of, &name, "of")?)?),
            max_length: required(raw.max_length, &name, "max_length")?,
        }),
        "bits" => Ok(FieldType::Bits(required(raw.bits, &name, "bits")?)),
        _ => Ok(FieldType::Scalar {
            kind: raw.kind,
            max_length: raw.max_length,
            variable: raw.variable,
        }),
    }
}

fn from_type(name: String, ty: FieldType) -> RawField {
    let mut raw = RawField {
        name,
        kind: String::new(),
        max_length: None,
        variable: false,
        length: None,
        of: None,
        schema: None,
        fields: None,
        bits: None,
    };
    match ty {
        FieldType::Scalar {
            kind,
            max_length,
            variable,
        } => {
            raw.kind = kind;
            raw.max_length = max_length;
            raw.variable = variable;
        }
        FieldType::Object(ObjectRef::Named(schema)) => {
            raw.kind = "object".to_string();
            raw.schema = Some(schema);
        }
        FieldType::Object(ObjectRef::Inline(fields)) => {
            raw.kind = "object".to_string();
            raw.fields = Some(fields.into_iter().map(RawField::from).collect());
        }
        FieldType::Array { of, length } => {
            raw.kind = "array".to_string();
            raw.of = Some(Box::new(from_type(String::new(), *of)));
            raw.length = Some(length);
        }
        FieldType::List { of, max_length } => {
            raw.kind = "list".to_string();
            raw.of = Some(Box::new(from_type(String::new(), *of)));
            raw.max_length = Some(max_length);
        }
        FieldType::Bits(bits) => {
            raw.kind = "bits".to_string();
            raw.bits = Some(bits);
        }
    }
    raw
}

impl TryFrom<RawField> for FieldDef {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err(format!("field of type '{}' has no name", raw.kind));
        }
        let name = raw.name.clone();
        Ok(FieldDef {
            name,
            ty: into_type(raw)?,
        })
    }
}

impl From<FieldDef> for RawField {
    fn from(field: FieldDef) -> Self {
        from_type(field.name, field.ty)
    }
}
