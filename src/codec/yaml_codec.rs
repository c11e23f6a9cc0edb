use serde_yaml::{Mapping, Number, Value};

use super::{CodecError, Decoder, Encoder};
use crate::field::{FieldError, RawValue, Section, classify_section};

/// YAML documents, registered under both `yml` and `yaml`.
///
/// An empty document decodes to an empty tree. Tags are ignored and the
/// tagged value is used as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Decoder for YamlCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Section, CodecError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Section::new());
        }
        let document: Value =
            serde_yaml::from_slice(bytes).map_err(|e| CodecError::Syntax(e.to_string()))?;

        let mapping = match document {
            Value::Null => return Ok(Section::new()),
            Value::Mapping(mapping) => mapping,
            Value::Tagged(tagged) => match tagged.value {
                Value::Mapping(mapping) => mapping,
                other => return Err(CodecError::NotAMapping(value_name(&other))),
            },
            other => return Err(CodecError::NotAMapping(value_name(&other))),
        };

        Ok(classify_section(entries_from_yaml(mapping)?)?)
    }
}

impl Encoder for YamlCodec {
    fn encode(&self, tree: &Section) -> Result<Vec<u8>, CodecError> {
        let text = serde_yaml::to_string(tree).map_err(|e| CodecError::Serialize(e.to_string()))?;
        Ok(text.into_bytes())
    }
}

fn entries_from_yaml(mapping: Mapping) -> Result<Vec<(String, RawValue)>, FieldError> {
    mapping
        .into_iter()
        .map(|(key, value)| Ok((key_from_yaml(key)?, raw_from_yaml(value)?)))
        .collect()
}

fn key_from_yaml(key: Value) -> Result<String, FieldError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Tagged(tagged) => key_from_yaml(tagged.value),
        other => Err(FieldError::UnsupportedKey {
            key: format!("{other:?}"),
        }),
    }
}

fn raw_from_yaml(value: Value) -> Result<RawValue, FieldError> {
    let raw = match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Bool(b),
        Value::Number(n) => raw_from_number(&n)?,
        Value::String(s) => RawValue::String(s),
        Value::Sequence(items) => RawValue::Seq(
            items
                .into_iter()
                .map(raw_from_yaml)
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(mapping) => RawValue::Map(entries_from_yaml(mapping)?),
        Value::Tagged(tagged) => raw_from_yaml(tagged.value)?,
    };
    Ok(raw)
}

fn raw_from_number(n: &Number) -> Result<RawValue, FieldError> {
    if let Some(i) = n.as_i64() {
        return Ok(RawValue::Int(i));
    }
    if n.is_u64() {
        return Err(FieldError::NumberOutOfRange {
            value: n.to_string(),
        });
    }
    match n.as_f64() {
        Some(f) => Ok(RawValue::Float(f)),
        None => Err(FieldError::NumberOutOfRange {
            value: n.to_string(),
        }),
    }
}

fn value_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
