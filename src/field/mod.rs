//! Typed configuration values.
//!
//! Every value held by a [`ConfigStore`](crate::config_store::ConfigStore) is a
//! [`Field`]: a scalar, a homogeneous sequence of scalars, or a nested
//! [`Section`]. Decoded documents are turned into fields by
//! [`Field::classify`], which maps an untyped [`RawValue`] onto exactly one of
//! the fixed kinds.

mod classify;
mod convert;
mod duration;


use std::{collections::BTreeMap, fmt, time::Duration};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Serialize, Serializer};

pub use classify::{FieldError, RawValue};
pub(crate) use classify::classify_section;
pub use convert::FromField;
pub use duration::{format_duration, parse_duration};

/// Timestamp representation used by [`Field::Time`].
pub type Timestamp = DateTime<FixedOffset>;

/// A mapping from key to field, one level of the configuration tree.
///
/// Lookup does not depend on key order; encoders emit keys in sorted order.
pub type Section = BTreeMap<String, Field>;

/// A configuration value tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer, the canonical storage for all integer accessors.
    Int(i64),
    /// 64-bit float, the canonical storage for all float accessors.
    Float(f64),
    /// Non-negative time span.
    Duration(Duration),
    /// Point in time with a fixed UTC offset.
    Time(Timestamp),
    /// Sequence of strings.
    StringSlice(Vec<String>),
    /// Sequence of booleans.
    BoolSlice(Vec<bool>),
    /// Sequence of integers.
    IntSlice(Vec<i64>),
    /// Sequence of floats.
    FloatSlice(Vec<f64>),
    /// Sequence of durations.
    DurationSlice(Vec<Duration>),
    /// Sequence of timestamps.
    TimeSlice(Vec<Timestamp>),
    /// Nested key/field mapping.
    Section(Section),
}

/// The kind tag of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// [`Field::String`]
    String,
    /// [`Field::Bool`]
    Bool,
    /// [`Field::Int`]
    Int,
    /// [`Field::Float`]
    Float,
    /// [`Field::Duration`]
    Duration,
    /// [`Field::Time`]
    Time,
    /// [`Field::StringSlice`]
    StringSlice,
    /// [`Field::BoolSlice`]
    BoolSlice,
    /// [`Field::IntSlice`]
    IntSlice,
    /// [`Field::FloatSlice`]
    FloatSlice,
    /// [`Field::DurationSlice`]
    DurationSlice,
    /// [`Field::TimeSlice`]
    TimeSlice,
    /// [`Field::Section`]
    Section,
}

impl FieldKind {
    /// Returns the kind name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Duration => "duration",
            FieldKind::Time => "time",
            FieldKind::StringSlice => "string slice",
            FieldKind::BoolSlice => "bool slice",
            FieldKind::IntSlice => "int slice",
            FieldKind::FloatSlice => "float slice",
            FieldKind::DurationSlice => "duration slice",
            FieldKind::TimeSlice => "time slice",
            FieldKind::Section => "section",
        }
    }

    /// Returns true for the sequence kinds.
    pub fn is_slice(self) -> bool {
        matches!(
            self,
            FieldKind::StringSlice
                | FieldKind::BoolSlice
                | FieldKind::IntSlice
                | FieldKind::FloatSlice
                | FieldKind::DurationSlice
                | FieldKind::TimeSlice
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Field {
    /// Returns the kind tag of this field.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::String(_) => FieldKind::String,
            Field::Bool(_) => FieldKind::Bool,
            Field::Int(_) => FieldKind::Int,
            Field::Float(_) => FieldKind::Float,
            Field::Duration(_) => FieldKind::Duration,
            Field::Time(_) => FieldKind::Time,
            Field::StringSlice(_) => FieldKind::StringSlice,
            Field::BoolSlice(_) => FieldKind::BoolSlice,
            Field::IntSlice(_) => FieldKind::IntSlice,
            Field::FloatSlice(_) => FieldKind::FloatSlice,
            Field::DurationSlice(_) => FieldKind::DurationSlice,
            Field::TimeSlice(_) => FieldKind::TimeSlice,
            Field::Section(_) => FieldKind::Section,
        }
    }

    /// Returns true if this is a sequence with no elements, whatever its element kind.
    pub fn is_empty_slice(&self) -> bool {
        match self {
            Field::StringSlice(v) => v.is_empty(),
            Field::BoolSlice(v) => v.is_empty(),
            Field::IntSlice(v) => v.is_empty(),
            Field::FloatSlice(v) => v.is_empty(),
            Field::DurationSlice(v) => v.is_empty(),
            Field::TimeSlice(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Borrows the section payload, if this is a section.
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Field::Section(section) => Some(section),
            _ => None,
        }
    }

    pub(crate) fn as_section_mut(&mut self) -> Option<&mut Section> {
        match self {
            Field::Section(section) => Some(section),
            _ => None,
        }
    }
}

pub(crate) fn format_timestamp(time: &Timestamp) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Durations and timestamps serialize as the string literals the classifier
/// reads back into the same kinds.
impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::String(s) => serializer.serialize_str(s),
            Field::Bool(b) => serializer.serialize_bool(*b),
            Field::Int(i) => serializer.serialize_i64(*i),
            Field::Float(f) => serializer.serialize_f64(*f),
            Field::Duration(d) => serializer.serialize_str(&format_duration(*d)),
            Field::Time(t) => serializer.serialize_str(&format_timestamp(t)),
            Field::StringSlice(v) => serializer.collect_seq(v),
            Field::BoolSlice(v) => serializer.collect_seq(v),
            Field::IntSlice(v) => serializer.collect_seq(v),
            Field::FloatSlice(v) => serializer.collect_seq(v),
            Field::DurationSlice(v) => serializer.collect_seq(v.iter().map(|d| format_duration(*d))),
            Field::TimeSlice(v) => serializer.collect_seq(v.iter().map(format_timestamp)),
            Field::Section(section) => serializer.collect_map(section),
        }
    }
}
