use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{Field, FieldKind, Section, Timestamp, parse_duration};

/// An untyped value as produced by a decoder or handed to
/// [`ConfigStore::set`](crate::config_store::ConfigStore::set).
///
/// [`Field::classify`] turns it into exactly one [`FieldKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number the source format marked as an integer.
    Int(i64),
    /// Number the source format marked as a float.
    Float(f64),
    /// Number from a format without an integer/float distinction.
    Number(f64),
    /// String, subject to duration and timestamp detection.
    String(String),
    /// Duration supplied directly.
    Duration(Duration),
    /// Timestamp supplied directly or decoded from a native datetime.
    Time(Timestamp),
    /// Ordered sequence.
    Seq(Vec<RawValue>),
    /// Key/value mapping.
    Map(Vec<(String, RawValue)>),
}

/// Reasons a [`RawValue`] cannot be classified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// Null has no field kind.
    #[error("null values are not supported")]
    Null,

    /// A sequence mixes element kinds.
    #[error("sequence mixes {first} and {found} elements")]
    MixedSequence {
        /// Kind of the first element.
        first: FieldKind,
        /// First element kind that differs.
        found: FieldKind,
    },

    /// A sequence contains sequences or sections.
    #[error("sequence elements must be scalars, found {found}")]
    NonScalarElement {
        /// Kind of the offending element.
        found: FieldKind,
    },

    /// A number fits neither the integer nor the float storage.
    #[error("number {value} is out of range")]
    NumberOutOfRange {
        /// Textual form of the number.
        value: String,
    },

    /// A datetime form the field model cannot represent.
    #[error("unsupported datetime '{value}'")]
    UnsupportedDatetime {
        /// Textual form of the datetime.
        value: String,
    },

    /// A mapping key that cannot be used as a section key.
    #[error("unsupported mapping key: {key}")]
    UnsupportedKey {
        /// Debug form of the key.
        key: String,
    },
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

impl Field {
    /// Classifies an untyped value into a field.
    ///
    /// Tie-break rules, applied in order:
    ///
    /// - `Int` is always an integer and `Float` always a float.
    /// - `Number` is an integer when it is finite, has no fractional part and
    ///   fits in `i64`; otherwise a float.
    /// - A string that is a complete duration literal (`"1m30s"`) is a duration.
    /// - A string that parses as RFC 3339 is a timestamp.
    /// - Any other string is a string.
    /// - A sequence must hold scalars of one kind. An empty sequence is an
    ///   empty string sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] for nulls, mixed or nested sequences.
    pub fn classify(value: RawValue) -> Result<Field, FieldError> {
        match value {
            RawValue::Seq(items) => classify_sequence(items),
            RawValue::Map(entries) => classify_section(entries).map(Field::Section),
            scalar => classify_scalar(scalar),
        }
    }
}

/// Classifies every entry of a mapping, for decoders building a whole tree.
///
/// # Errors
///
/// Returns the first [`FieldError`] encountered.
pub(crate) fn classify_section(entries: Vec<(String, RawValue)>) -> Result<Section, FieldError> {
    entries
        .into_iter()
        .map(|(key, value)| Field::classify(value).map(|field| (key, field)))
        .collect()
}

fn classify_scalar(value: RawValue) -> Result<Field, FieldError> {
    match value {
        RawValue::Null => Err(FieldError::Null),
        RawValue::Bool(b) => Ok(Field::Bool(b)),
        RawValue::Int(i) => Ok(Field::Int(i)),
        RawValue::Float(f) => Ok(Field::Float(f)),
        RawValue::Number(n) => Ok(classify_number(n)),
        RawValue::String(s) => Ok(classify_string(s)),
        RawValue::Duration(d) => Ok(Field::Duration(d)),
        RawValue::Time(t) => Ok(Field::Time(t)),
        RawValue::Seq(items) => classify_sequence(items),
        RawValue::Map(entries) => classify_section(entries).map(Field::Section),
    }
}

fn classify_number(n: f64) -> Field {
    if n.is_finite() && n.fract() == 0.0 && n >= -I64_UPPER && n < I64_UPPER {
        #[allow(clippy::cast_possible_truncation)]
        let int = n as i64;
        return Field::Int(int);
    }
    Field::Float(n)
}

fn classify_string(s: String) -> Field {
    if let Some(duration) = parse_duration(&s) {
        return Field::Duration(duration);
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(&s) {
        return Field::Time(time);
    }
    Field::String(s)
}

fn classify_sequence(items: Vec<RawValue>) -> Result<Field, FieldError> {
    let mut fields = Vec::with_capacity(items.len());
    for item in items {
        let field = classify_scalar(item)?;
        let kind = field.kind();
        if kind.is_slice() || kind == FieldKind::Section {
            return Err(FieldError::NonScalarElement { found: kind });
        }
        if let Some(first) = fields.first().map(Field::kind) {
            if first != kind {
                return Err(FieldError::MixedSequence { first, found: kind });
            }
        }
        fields.push(field);
    }

    let Some(first) = fields.first().map(Field::kind) else {
        return Ok(Field::StringSlice(Vec::new()));
    };

    let slice = match first {
        FieldKind::String => Field::StringSlice(collect(fields, |f| match f {
            Field::String(s) => Some(s),
            _ => None,
        })),
        FieldKind::Bool => Field::BoolSlice(collect(fields, |f| match f {
            Field::Bool(b) => Some(b),
            _ => None,
        })),
        FieldKind::Int => Field::IntSlice(collect(fields, |f| match f {
            Field::Int(i) => Some(i),
            _ => None,
        })),
        FieldKind::Float => Field::FloatSlice(collect(fields, |f| match f {
            Field::Float(x) => Some(x),
            _ => None,
        })),
        FieldKind::Duration => Field::DurationSlice(collect(fields, |f| match f {
            Field::Duration(d) => Some(d),
            _ => None,
        })),
        FieldKind::Time => Field::TimeSlice(collect(fields, |f| match f {
            Field::Time(t) => Some(t),
            _ => None,
        })),
        other => return Err(FieldError::NonScalarElement { found: other }),
    };
    Ok(slice)
}

// Every element was checked against the first element's kind above.
fn collect<T>(fields: Vec<Field>, extract: impl Fn(Field) -> Option<T>) -> Vec<T> {
    fields.into_iter().filter_map(extract).collect()
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Int(i64::from(value))
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Int(i64::from(value))
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<f32> for RawValue {
    fn from(value: f32) -> Self {
        RawValue::Float(f64::from(value))
    }
}

impl From<Duration> for RawValue {
    fn from(value: Duration) -> Self {
        RawValue::Duration(value)
    }
}

impl From<Timestamp> for RawValue {
    fn from(value: Timestamp) -> Self {
        RawValue::Time(value)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(value: DateTime<Utc>) -> Self {
        RawValue::Time(value.fixed_offset())
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(values: Vec<T>) -> Self {
        RawValue::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl From<Field> for RawValue {
    fn from(field: Field) -> Self {
        match field {
            Field::String(s) => RawValue::String(s),
            Field::Bool(b) => RawValue::Bool(b),
            Field::Int(i) => RawValue::Int(i),
            Field::Float(f) => RawValue::Float(f),
            Field::Duration(d) => RawValue::Duration(d),
            Field::Time(t) => RawValue::Time(t),
            Field::StringSlice(v) => v.into(),
            Field::BoolSlice(v) => v.into(),
            Field::IntSlice(v) => v.into(),
            Field::FloatSlice(v) => v.into(),
            Field::DurationSlice(v) => v.into(),
            Field::TimeSlice(v) => v.into(),
            Field::Section(section) => section.into(),
        }
    }
}

impl From<Section> for RawValue {
    fn from(section: Section) -> Self {
        RawValue::Map(
            section
                .into_iter()
                .map(|(key, field)| (key, RawValue::from(field)))
                .collect(),
        )
    }
}
