use chrono::{DateTime, NaiveDate, NaiveDateTime};
use toml::{Value, value::Datetime};

use super::{CodecError, Decoder, Encoder};
use crate::field::{
    Field, FieldError, RawValue, Section, Timestamp, classify_section, format_duration,
    format_timestamp,
};

/// TOML documents.
///
/// Native TOML datetimes decode to timestamps: offset-less date-times are
/// read as UTC and bare dates as midnight UTC. Timestamps encode back to
/// native datetimes; durations encode as duration literal strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl Decoder for TomlCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Section, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::Syntax(format!("document is not UTF-8: {e}")))?;
        let table: toml::Table =
            toml::from_str(text).map_err(|e| CodecError::Syntax(e.to_string()))?;

        let entries = table
            .into_iter()
            .map(|(key, value)| Ok((key, raw_from_toml(value)?)))
            .collect::<Result<Vec<_>, CodecError>>()?;

        Ok(classify_section(entries)?)
    }
}

impl Encoder for TomlCodec {
    fn encode(&self, tree: &Section) -> Result<Vec<u8>, CodecError> {
        let table = to_toml_table(tree)?;
        let text =
            toml::to_string_pretty(&table).map_err(|e| CodecError::Serialize(e.to_string()))?;
        Ok(text.into_bytes())
    }
}

fn raw_from_toml(value: Value) -> Result<RawValue, CodecError> {
    let raw = match value {
        Value::String(s) => RawValue::String(s),
        Value::Integer(i) => RawValue::Int(i),
        Value::Float(f) => RawValue::Float(f),
        Value::Boolean(b) => RawValue::Bool(b),
        Value::Datetime(datetime) => RawValue::Time(timestamp_from_toml(&datetime)?),
        Value::Array(items) => RawValue::Seq(
            items
                .into_iter()
                .map(raw_from_toml)
                .collect::<Result<_, _>>()?,
        ),
        Value::Table(table) => RawValue::Map(
            table
                .into_iter()
                .map(|(key, value)| Ok((key, raw_from_toml(value)?)))
                .collect::<Result<_, CodecError>>()?,
        ),
    };
    Ok(raw)
}

fn timestamp_from_toml(datetime: &Datetime) -> Result<Timestamp, FieldError> {
    let text = datetime.to_string();

    if let Ok(time) = DateTime::parse_from_rfc3339(&text) {
        return Ok(time);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc().fixed_offset());
    }
    if let Some(naive) = NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc().fixed_offset());
    }

    Err(FieldError::UnsupportedDatetime { value: text })
}

fn to_toml_table(section: &Section) -> Result<toml::Table, CodecError> {
    section
        .iter()
        .map(|(key, field)| Ok((key.clone(), to_toml_value(field)?)))
        .collect()
}

fn to_toml_value(field: &Field) -> Result<Value, CodecError> {
    let value = match field {
        Field::String(s) => Value::String(s.clone()),
        Field::Bool(b) => Value::Boolean(*b),
        Field::Int(i) => Value::Integer(*i),
        Field::Float(f) => Value::Float(*f),
        Field::Duration(d) => Value::String(format_duration(*d)),
        Field::Time(t) => Value::Datetime(timestamp_to_toml(t)?),
        Field::StringSlice(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        Field::BoolSlice(v) => Value::Array(v.iter().copied().map(Value::Boolean).collect()),
        Field::IntSlice(v) => Value::Array(v.iter().copied().map(Value::Integer).collect()),
        Field::FloatSlice(v) => Value::Array(v.iter().copied().map(Value::Float).collect()),
        Field::DurationSlice(v) => Value::Array(
            v.iter()
                .map(|d| Value::String(format_duration(*d)))
                .collect(),
        ),
        Field::TimeSlice(v) => Value::Array(
            v.iter()
                .map(|t| timestamp_to_toml(t).map(Value::Datetime))
                .collect::<Result<_, _>>()?,
        ),
        Field::Section(section) => Value::Table(to_toml_table(section)?),
    };
    Ok(value)
}

fn timestamp_to_toml(time: &Timestamp) -> Result<Datetime, CodecError> {
    format_timestamp(time)
        .parse::<Datetime>()
        .map_err(|e| CodecError::Serialize(e.to_string()))
}
