use std::time::Duration;

use super::ConfigStore;
use crate::{
    error::Result,
    field::{Section, Timestamp},
};

macro_rules! getters {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)+) => {
        impl ConfigStore {
            $(
                $(#[$doc])*
                ///
                /// # Errors
                /// See [`ConfigStore::get`].
                pub fn $name(&self, key: &str) -> Result<$ty> {
                    self.get::<$ty>(key)
                }
            )+
        }
    };
}

getters! {
    /// Reads a string.
    get_string => String;
    /// Reads a boolean.
    get_bool => bool;
    /// Reads an integer; same as `get_int64`.
    get_int => i64;
    /// Reads an integer that must fit in `i32`.
    get_int32 => i32;
    /// Reads an integer.
    get_int64 => i64;
    /// Reads a non-negative integer.
    get_uint => usize;
    /// Reads an integer that must fit in `u32`.
    get_uint32 => u32;
    /// Reads a non-negative integer that must fit in `u64`.
    get_uint64 => u64;
    /// Reads a float that must fit in `f32`.
    get_float32 => f32;
    /// Reads a float.
    get_float64 => f64;
    /// Reads a duration.
    get_duration => Duration;
    /// Reads a timestamp.
    get_time => Timestamp;
    /// Reads a copy of a nested section.
    get_section_map => Section;

    /// Reads a string sequence.
    get_string_slice => Vec<String>;
    /// Reads a boolean sequence.
    get_bool_slice => Vec<bool>;
    /// Reads an integer sequence.
    get_int_slice => Vec<i64>;
    /// Reads an integer sequence whose elements must fit in `i32`.
    get_int32_slice => Vec<i32>;
    /// Reads an integer sequence.
    get_int64_slice => Vec<i64>;
    /// Reads a non-negative integer sequence.
    get_uint_slice => Vec<usize>;
    /// Reads an integer sequence whose elements must fit in `u32`.
    get_uint32_slice => Vec<u32>;
    /// Reads a non-negative integer sequence.
    get_uint64_slice => Vec<u64>;
    /// Reads a float sequence whose elements must fit in `f32`.
    get_float32_slice => Vec<f32>;
    /// Reads a float sequence.
    get_float64_slice => Vec<f64>;
    /// Reads a duration sequence.
    get_duration_slice => Vec<Duration>;
    /// Reads a timestamp sequence.
    get_time_slice => Vec<Timestamp>;
}
