//! Pixel element types and saturating conversion between them.
//!
//! Every conversion goes through `f64` (or `i64` for integer arithmetic) and
//! clamps to the target range. Float to integer truncates toward zero and maps
//! NaN to zero; nothing ever wraps around.

use ndarray::Array3;
use num_traits::Bounded;

use super::Pixels;
use crate::error::TileError;

/// Element type of a tile buffer, tagged with its stable external code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Byte = 1,
    UInt16 = 2,
    Int16 = 3,
    UInt32 = 4,
    Int32 = 5,
    Float32 = 6,
    Float64 = 7,
}

impl ElementType {
    pub const ALL: [ElementType; 7] = [
        Self::Byte,
        Self::UInt16,
        Self::Int16,
        Self::UInt32,
        Self::Int32,
        Self::Float32,
        Self::Float64,
    ];

    /// Parse the external integer code (1..=7).
    pub fn from_code(code: i64) -> Result<Self, TileError> {
        Self::ALL
            .into_iter()
            .find(|t| i64::from(t.code()) == code)
            .ok_or(TileError::UnknownTypeCode(code))
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::UInt16 => "uint16",
            Self::Int16 => "int16",
            Self::UInt32 => "uint32",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }
}

/// A Rust scalar type that can be stored in a tile buffer.
pub trait Element:
    Copy + Default + PartialEq + PartialOrd + num_traits::NumCast + Bounded + Send + Sync + 'static
{
    const TYPE: ElementType;

    fn to_f64(self) -> f64;

    /// Saturating conversion from `f64`.
    fn from_f64(v: f64) -> Self;

    /// Saturating conversion from `i64`.
    fn from_i64(v: i64) -> Self;

    fn wrap(array: Array3<Self>) -> Pixels;

    fn write_le(self, out: &mut Vec<u8>);

    /// Read one element from exactly `TYPE.size()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! integer_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                if v.is_nan() {
                    return 0;
                }
                let lo = f64::from(<$t as Bounded>::min_value());
                let hi = f64::from(<$t as Bounded>::max_value());
                <$t as num_traits::NumCast>::from(v.trunc().clamp(lo, hi)).unwrap_or_default()
            }

            #[inline]
            fn from_i64(v: i64) -> Self {
                let lo = i64::from(<$t as Bounded>::min_value());
                let hi = i64::from(<$t as Bounded>::max_value());
                <$t as num_traits::NumCast>::from(v.clamp(lo, hi)).unwrap_or_default()
            }

            fn wrap(array: Array3<Self>) -> Pixels {
                Pixels::$variant(array)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    };
}

integer_element!(u8, Byte);
integer_element!(u16, UInt16);
integer_element!(i16, Int16);
integer_element!(u32, UInt32);
integer_element!(i32, Int32);

impl Element for f32 {
    const TYPE: ElementType = ElementType::Float32;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        // NaN and the infinities are representable as-is
        let v = if v.is_finite() {
            v.clamp(f64::from(f32::MIN), f64::from(f32::MAX))
        } else {
            v
        };
        v as f32
    }

    #[inline]
    fn from_i64(v: i64) -> Self {
        Self::from_f64(v as f64)
    }

    fn wrap(array: Array3<Self>) -> Pixels {
        Pixels::Float32(array)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        f32::from_le_bytes(raw)
    }
}

impl Element for f64 {
    const TYPE: ElementType = ElementType::Float64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn from_i64(v: i64) -> Self {
        v as f64
    }

    fn wrap(array: Array3<Self>) -> Pixels {
        Pixels::Float64(array)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        f64::from_le_bytes(raw)
    }
}
