use std::time::Duration;

use super::{Field, FieldKind, Section, Timestamp};
use crate::error::ConfigError;

/// Conversion from a resolved [`Field`] into a Rust value.
///
/// Implementations compare the field's kind against the canonical kind of
/// the target type (`int` for every integer width, `float` for `f32`/`f64`)
/// and return owned data, so nothing handed out aliases the store's tree.
pub trait FromField: Sized {
    /// Converts the field stored under `key`.
    ///
    /// # Errors
    ///
    /// * `ConfigError::TypeMismatch` - If the field has a different kind
    /// * `ConfigError::OutOfRange` - If a narrowing conversion loses the value
    fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError>;
}

fn mismatch(key: &str, expected: FieldKind, field: &Field) -> ConfigError {
    ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
        actual: field.kind(),
    }
}

macro_rules! direct {
    ($ty:ty, $variant:ident) => {
        impl FromField for $ty {
            #[allow(clippy::clone_on_copy)]
            fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError> {
                match field {
                    Field::$variant(value) => Ok(value.clone()),
                    other => Err(mismatch(key, FieldKind::$variant, other)),
                }
            }
        }
    };
}

// An empty sequence carries no element kind worth rejecting.
macro_rules! direct_slice {
    ($elem:ty, $variant:ident) => {
        impl FromField for Vec<$elem> {
            fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError> {
                match field {
                    Field::$variant(values) => Ok(values.clone()),
                    other if other.is_empty_slice() => Ok(Vec::new()),
                    other => Err(mismatch(key, FieldKind::$variant, other)),
                }
            }
        }
    };
}

macro_rules! narrow_int {
    ($($ty:ty),+) => {
        $(
            impl FromField for $ty {
                fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError> {
                    narrow_int(key, i64::from_field(key, field)?)
                }
            }

            impl FromField for Vec<$ty> {
                fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError> {
                    Vec::<i64>::from_field(key, field)?
                        .into_iter()
                        .map(|value| narrow_int(key, value))
                        .collect()
                }
            }
        )+
    };
}

direct!(String, String);
direct!(bool, Bool);
direct!(i64, Int);
direct!(f64, Float);
direct!(Duration, Duration);
direct!(Timestamp, Time);
direct!(Section, Section);

direct_slice!(String, StringSlice);
direct_slice!(bool, BoolSlice);
direct_slice!(i64, IntSlice);
direct_slice!(f64, FloatSlice);
direct_slice!(Duration, DurationSlice);
direct_slice!(Timestamp, TimeSlice);

narrow_int!(i32, u8, u16, u32, u64, usize);

impl FromField for f32 {
    fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError> {
        narrow_float(key, f64::from_field(key, field)?)
    }
}

impl FromField for Vec<f32> {
    fn from_field(key: &str, field: &Field) -> Result<Self, ConfigError> {
        Vec::<f64>::from_field(key, field)?
            .into_iter()
            .map(|value| narrow_float(key, value))
            .collect()
    }
}

impl FromField for Field {
    fn from_field(_key: &str, field: &Field) -> Result<Self, ConfigError> {
        Ok(field.clone())
    }
}

fn narrow_int<T: TryFrom<i64>>(key: &str, value: i64) -> Result<T, ConfigError> {
    T::try_from(value).map_err(|_| ConfigError::OutOfRange {
        key: key.to_string(),
        value: value.to_string(),
        target: std::any::type_name::<T>(),
    })
}

fn narrow_float(key: &str, value: f64) -> Result<f32, ConfigError> {
    if value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            target: "f32",
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let narrowed = value as f32;
    Ok(narrowed)
}
