// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Data types of graph values and the promotion rules that combine them.

use core::fmt;
use core::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// The data type of a value flowing through a computation graph.
///
/// The set is closed: integers of any positive bit width, signed or
/// unsigned, and floats. Equality and ordering are structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Integer { bit_width: u32, is_signed: bool },
    Float { bit_width: u32 },
}

impl DataType {
    /// An unsigned integer of the given bit width.
    pub fn unsigned(bit_width: u32) -> DataType {
        debug_assert!(bit_width > 0, "data types must have a positive bit width");
        DataType::Integer {
            bit_width,
            is_signed: false,
        }
    }

    /// A signed integer of the given bit width.
    pub fn signed(bit_width: u32) -> DataType {
        debug_assert!(bit_width > 0, "data types must have a positive bit width");
        DataType::Integer {
            bit_width,
            is_signed: true,
        }
    }

    /// A float of the given bit width.
    pub fn float(bit_width: u32) -> DataType {
        debug_assert!(bit_width > 0, "data types must have a positive bit width");
        DataType::Float { bit_width }
    }

    pub const fn is_integer(&self) -> bool {
        matches!(self, DataType::Integer { .. })
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, DataType::Float { .. })
    }

    /// Whether values of this type can be negative. Floats always can.
    pub const fn is_signed(&self) -> bool {
        match self {
            DataType::Integer { is_signed, .. } => *is_signed,
            DataType::Float { .. } => true,
        }
    }

    pub const fn bit_width(&self) -> u32 {
        match self {
            DataType::Integer { bit_width, .. } | DataType::Float { bit_width } => *bit_width,
        }
    }

    /// The smallest integer type able to hold `value` exactly.
    ///
    /// Negative values infer a signed type; non-negative values infer the
    /// minimal unsigned type. Constants typed this way may later widen
    /// through [`find_type_to_hold_both`] when combined with other operands.
    pub fn to_represent(value: i64) -> DataType {
        let is_signed = value < 0;
        DataType::Integer {
            bit_width: bit_width_to_represent(value, is_signed),
            is_signed,
        }
    }

    /// The smallest integer type able to hold every value in
    /// `[minimum, maximum]`.
    ///
    /// Tracers use this to type inputs from observed bounds.
    pub fn to_represent_range(minimum: i64, maximum: i64) -> DataType {
        debug_assert!(minimum <= maximum, "range bounds must be ordered");
        find_type_to_hold_both(
            DataType::to_represent(minimum),
            DataType::to_represent(maximum),
        )
    }
}

/// Number of bits needed to represent `value` as an integer of the given
/// signedness. A negative `value` requires `is_signed`.
pub fn bit_width_to_represent(value: i64, is_signed: bool) -> u32 {
    debug_assert!(
        is_signed || value >= 0,
        "negative values require a signed type"
    );
    if value < 0 {
        ceil_log2(value.unsigned_abs()) + 1
    } else if is_signed {
        match value {
            0 => 1,
            _ => bit_length(value as u64) + 1,
        }
    } else {
        bit_length(value as u64)
    }
}

fn bit_length(value: u64) -> u32 {
    if value == 0 {
        1
    } else {
        64 - value.leading_zeros()
    }
}

fn ceil_log2(value: u64) -> u32 {
    if value <= 1 {
        0
    } else {
        64 - (value - 1).leading_zeros()
    }
}

/// Determine the type able to represent values of both `dtype1` and
/// `dtype2`.
///
/// Integer/integer and float/float combinations are exact. Mixing an
/// integer with a float returns the float side and is the one lossy case:
/// the integer operand may not be representable exactly at that width.
///
/// When the operands are integers of mixed signedness, the result is signed
/// and must cover the unsigned side's maximum value: if the unsigned
/// operand's width is at least the signed operand's, one extra sign bit is
/// required on top of the unsigned width; otherwise the signed operand's
/// width already suffices. Adding that sign bit to a `u32::MAX`-wide
/// unsigned operand has no representable result and panics.
pub fn find_type_to_hold_both(dtype1: DataType, dtype2: DataType) -> DataType {
    use DataType::{Float, Integer};

    match (dtype1, dtype2) {
        (
            Integer {
                bit_width: width1,
                is_signed: signed1,
            },
            Integer {
                bit_width: width2,
                is_signed: signed2,
            },
        ) => match (signed1, signed2) {
            (true, true) => DataType::signed(width1.max(width2)),
            (false, false) => DataType::unsigned(width1.max(width2)),
            (true, false) => hold_signed_and_unsigned(width1, width2),
            (false, true) => hold_signed_and_unsigned(width2, width1),
        },
        (Float { bit_width: width1 }, Float { bit_width: width2 }) => {
            DataType::float(width1.max(width2))
        }
        (float @ Float { .. }, Integer { .. }) | (Integer { .. }, float @ Float { .. }) => float,
    }
}

fn hold_signed_and_unsigned(signed_width: u32, unsigned_width: u32) -> DataType {
    if signed_width > unsigned_width {
        DataType::signed(signed_width)
    } else {
        match unsigned_width.checked_add(1) {
            Some(bit_width) => DataType::signed(bit_width),
            None => panic!("no signed type can hold uint{unsigned_width}"),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer {
                bit_width,
                is_signed: true,
            } => write!(f, "int{bit_width}"),
            DataType::Integer {
                bit_width,
                is_signed: false,
            } => write!(f, "uint{bit_width}"),
            DataType::Float { bit_width } => write!(f, "float{bit_width}"),
        }
    }
}

lazy_static! {
    static ref DATA_TYPE_PATTERN: Regex =
        Regex::new(r"^(int|uint|float)([1-9][0-9]*)$").expect("data type pattern is valid");
}

/// Error raised when a data type string does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a data type; expected the form `uint4`, `int5` or `float64`")]
pub struct ParseDataTypeError(String);

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = DATA_TYPE_PATTERN
            .captures(s)
            .ok_or_else(|| ParseDataTypeError(s.to_string()))?;
        let bit_width: u32 = captures[2]
            .parse()
            .map_err(|_| ParseDataTypeError(s.to_string()))?;
        Ok(match &captures[1] {
            "int" => DataType::signed(bit_width),
            "uint" => DataType::unsigned(bit_width),
            _ => DataType::float(bit_width),
        })
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
