//! Multi-tile compositing.
//!
//! Reduces a stack of same-shape tiles, typically one per acquisition date,
//! to a single tile by a per-pixel statistic over the samples that fall in
//! the valid range.

pub mod reduce;

use ndarray::Array3;

use crate::algebra::ValidRange;
use crate::buffer::{with_element_type, Element, ElementType, TileBuffer};
use crate::error::TileError;
use crate::tile::TILE_SIZE;

/// Per-pixel statistic, tagged with its stable external code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeMethod {
    Min = 1,
    Max = 2,
    Average = 3,
    Sum = 4,
    Count = 5,
}

impl CompositeMethod {
    /// Parse the external integer code (1..=5).
    pub fn from_code(code: i64) -> Result<Self, TileError> {
        match code {
            1 => Ok(Self::Min),
            2 => Ok(Self::Max),
            3 => Ok(Self::Average),
            4 => Ok(Self::Sum),
            5 => Ok(Self::Count),
            _ => Err(TileError::UnknownMethodCode(code)),
        }
    }

    /// Parse from a string name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "ave" | "average" | "mean" => Some(Self::Average),
            "sum" => Some(Self::Sum),
            "cnt" | "count" => Some(Self::Count),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Parameters of a composite call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    pub method: CompositeMethod,
    /// Samples outside this inclusive range are ignored.
    pub valid: ValidRange,
    /// Written where a pixel has no valid sample.
    pub fill: f64,
    /// Defaults to the element type of the inputs.
    pub out_type: Option<ElementType>,
}

impl CompositeParams {
    pub fn new(method: CompositeMethod, valid: ValidRange, fill: f64) -> Self {
        Self {
            method,
            valid,
            fill,
            out_type: None,
        }
    }

    pub fn with_out_type(mut self, out_type: ElementType) -> Self {
        self.out_type = Some(out_type);
        self
    }
}

/// Composite `inputs` into one tile.
///
/// All inputs must share band count and element type. The result does not
/// depend on the order of `inputs`. With no inputs the result is a single
/// band tile holding `fill` (as `Byte` unless an output type is given).
///
/// # Errors
/// [`TileError::Shape`] on band count disagreement and
/// [`TileError::TypeMismatch`] on element type disagreement.
pub fn composite(
    inputs: &[&TileBuffer],
    params: &CompositeParams,
) -> Result<TileBuffer, TileError> {
    let Some(first) = inputs.first() else {
        let out_type = params.out_type.unwrap_or(ElementType::Byte);
        return TileBuffer::create(out_type, TILE_SIZE, TILE_SIZE, 1, Some(params.fill));
    };
    for buf in &inputs[1..] {
        if buf.band_count() != first.band_count() {
            return Err(TileError::Shape(format!(
                "cannot composite {} band(s) with {}",
                buf.band_count(),
                first.band_count()
            )));
        }
        if buf.element_type() != first.element_type() {
            return Err(TileError::TypeMismatch {
                expected: first.element_type(),
                found: buf.element_type(),
            });
        }
    }

    let samples: Vec<Array3<f64>> = inputs.iter().map(|b| b.to_f64_array()).collect();
    let exact_sum = first.element_type().is_integer();
    let reduced = reduce::reduce(&samples, params.method, params.valid, exact_sum);

    let out_type = params.out_type.unwrap_or_else(|| first.element_type());
    let round = params.method == CompositeMethod::Average && out_type.is_integer();
    let pixels = with_element_type!(out_type, T => {
        let fill = T::from_f64(params.fill);
        T::wrap(reduced.mapv(|v| match v {
            Some(v) if round => T::from_f64(v.round()),
            Some(v) => T::from_f64(v),
            None => fill,
        }))
    });
    Ok(TileBuffer::from_pixels(pixels))
}
