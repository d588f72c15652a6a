//! Tile-by-tile arithmetic: C = A op B.

use ndarray::{Array3, Zip};

use super::{ArithOp, ValidRange};
use crate::buffer::{with_element_type, Element, ElementType, TileBuffer};
use crate::error::TileError;

/// Combine `a` and `b` pixel by pixel.
///
/// A pixel is computed only when both raw inputs lie in `valid`; otherwise,
/// and wherever `b` is zero for [`ArithOp::Div`], the output is `fill`.
/// Integer inputs use 64-bit integer arithmetic, anything involving a float
/// uses `f64`. The result saturates into `out_type`, which defaults to the
/// element type of `a`.
///
/// # Errors
/// [`TileError::Shape`] when the band counts differ.
pub fn combine(
    a: &TileBuffer,
    b: &TileBuffer,
    op: ArithOp,
    valid: ValidRange,
    fill: f64,
    out_type: Option<ElementType>,
) -> Result<TileBuffer, TileError> {
    if !a.same_shape(b) {
        return Err(TileError::Shape(format!(
            "band count {} does not match {}",
            b.band_count(),
            a.band_count()
        )));
    }
    let out_type = out_type.unwrap_or_else(|| a.element_type());
    let integer = a.element_type().is_integer() && b.element_type().is_integer();

    let xs = a.to_f64_array();
    let ys = b.to_f64_array();
    let pixels = with_element_type!(out_type, T => {
        T::wrap(combine_arrays::<T>(&xs, &ys, op, valid, fill, integer))
    });
    Ok(TileBuffer::from_pixels(pixels))
}

fn combine_arrays<T: Element>(
    xs: &Array3<f64>,
    ys: &Array3<f64>,
    op: ArithOp,
    valid: ValidRange,
    fill: f64,
    integer: bool,
) -> Array3<T> {
    let fill = T::from_f64(fill);
    Zip::from(xs).and(ys).par_map_collect(|&x, &y| {
        if !valid.contains(x) || !valid.contains(y) || (op == ArithOp::Div && y == 0.0) {
            fill
        } else if integer {
            // Both values came from integer buffers, so the casts are exact
            #[allow(clippy::cast_possible_truncation)]
            T::from_i64(op.apply_i64(x as i64, y as i64))
        } else {
            T::from_f64(op.apply_f64(x, y))
        }
    })
}

impl TileBuffer {
    /// `self + other`; see [`combine`].
    pub fn add(
        &self,
        other: &TileBuffer,
        valid: ValidRange,
        fill: f64,
    ) -> Result<TileBuffer, TileError> {
        combine(self, other, ArithOp::Add, valid, fill, None)
    }

    /// `self - other`; see [`combine`].
    pub fn sub(
        &self,
        other: &TileBuffer,
        valid: ValidRange,
        fill: f64,
    ) -> Result<TileBuffer, TileError> {
        combine(self, other, ArithOp::Sub, valid, fill, None)
    }

    /// `self * other`; see [`combine`].
    pub fn mul(
        &self,
        other: &TileBuffer,
        valid: ValidRange,
        fill: f64,
    ) -> Result<TileBuffer, TileError> {
        combine(self, other, ArithOp::Mul, valid, fill, None)
    }

    /// `self / other`; zero divisors produce `fill`. See [`combine`].
    pub fn div(
        &self,
        other: &TileBuffer,
        valid: ValidRange,
        fill: f64,
    ) -> Result<TileBuffer, TileError> {
        combine(self, other, ArithOp::Div, valid, fill, None)
    }

    /// `self - other` written as `out_type` (defaults to the type of `self`).
    pub fn subtract(
        &self,
        other: &TileBuffer,
        valid: ValidRange,
        fill: f64,
        out_type: Option<ElementType>,
    ) -> Result<TileBuffer, TileError> {
        combine(self, other, ArithOp::Sub, valid, fill, out_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(ty: ElementType, bands: usize, value: f64) -> TileBuffer {
        TileBuffer::create(ty, 256, 256, bands, Some(value)).unwrap()
    }

    #[test]
    fn test_add_is_commutative_for_valid_pixels() {
        let mut a = filled(ElementType::Int32, 2, 7.0);
        let mut b = filled(ElementType::Int32, 2, -3.0);
        a.set_value(1, 4, 9, 1000.0).unwrap();
        b.set_value(0, 100, 3, 250.0).unwrap();
        let range = ValidRange::new(-10_000.0, 10_000.0);
        let ab = a.add(&b, range, -1.0).unwrap();
        let ba = b.add(&a, range, -1.0).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.value(1, 4, 9).unwrap(), 997.0);
        assert_eq!(ab.value(0, 100, 3).unwrap(), 257.0);
    }

    #[test]
    fn test_out_of_range_takes_fill() {
        let a = filled(ElementType::Byte, 1, 255.0);
        let b = filled(ElementType::Byte, 1, 10.0);
        let c = a.add(&b, ValidRange::new(0.0, 254.0), 0.0).unwrap();
        assert_eq!(c.value(0, 0, 0).unwrap(), 0.0);

        // The check applies to B as well
        let c = b.add(&a, ValidRange::new(0.0, 254.0), 3.0).unwrap();
        assert_eq!(c.value(0, 0, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_div_by_zero_takes_fill() {
        for &numerator in &[0.0, 1.0, 100.0, 255.0] {
            let a = filled(ElementType::Byte, 1, numerator);
            let b = filled(ElementType::Byte, 1, 0.0);
            let c = a.div(&b, ValidRange::all(), 77.0).unwrap();
            assert_eq!(c.value(0, 0, 0).unwrap(), 77.0, "numerator {numerator}");
        }
        let a = filled(ElementType::Float32, 1, 1.5);
        let b = filled(ElementType::Float64, 1, 0.0);
        let c = a.div(&b, ValidRange::all(), -9999.0).unwrap();
        assert_eq!(c.value(0, 1, 1).unwrap(), -9999.0);
    }

    #[test]
    fn test_integer_division_truncates() {
        let a = filled(ElementType::Int16, 1, -7.0);
        let b = filled(ElementType::Int16, 1, 2.0);
        let c = a.div(&b, ValidRange::all(), 0.0).unwrap();
        assert_eq!(c.value(0, 0, 0).unwrap(), -3.0);
    }

    #[test]
    fn test_mixed_types_use_float_and_saturate_into_a() {
        let a = filled(ElementType::Byte, 1, 200.0);
        let b = filled(ElementType::Float32, 1, 1.75);
        let c = a.mul(&b, ValidRange::all(), 0.0).unwrap();
        assert_eq!(c.element_type(), ElementType::Byte);
        assert_eq!(c.value(0, 0, 0).unwrap(), 255.0);

        let c = b.mul(&a, ValidRange::all(), 0.0).unwrap();
        assert_eq!(c.element_type(), ElementType::Float32);
        assert_eq!(c.value(0, 0, 0).unwrap(), 350.0);
    }

    #[test]
    fn test_sub_saturates_at_zero_for_unsigned() {
        let a = filled(ElementType::UInt16, 1, 5.0);
        let b = filled(ElementType::UInt16, 1, 10.0);
        let c = a.sub(&b, ValidRange::all(), 0.0).unwrap();
        assert_eq!(c.value(0, 0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_no_intermediate_overflow() {
        let a = filled(ElementType::UInt32, 1, f64::from(u32::MAX));
        let b = filled(ElementType::UInt32, 1, f64::from(u32::MAX));
        let c = a.sub(&b.add(&a, ValidRange::all(), 0.0).unwrap(), ValidRange::all(), 0.0);
        // (max + max) saturates to max, so max - max == 0
        assert_eq!(c.unwrap().value(0, 0, 0).unwrap(), 0.0);

        let big = filled(ElementType::Int32, 1, f64::from(i32::MAX));
        let c = big.mul(&big, ValidRange::all(), 0.0).unwrap();
        assert_eq!(c.value(0, 0, 0).unwrap(), f64::from(i32::MAX));
    }

    #[test]
    fn test_band_count_mismatch_fails() {
        let a = filled(ElementType::Byte, 1, 1.0);
        let b = filled(ElementType::Byte, 2, 1.0);
        assert!(matches!(
            a.add(&b, ValidRange::all(), 0.0),
            Err(TileError::Shape(_))
        ));
    }

    #[test]
    fn test_subtract_with_output_type() {
        let a = filled(ElementType::Byte, 1, 5.0);
        let b = filled(ElementType::Byte, 1, 10.0);
        let c = a
            .subtract(&b, ValidRange::new(0.0, 254.0), 255.0, Some(ElementType::Int16))
            .unwrap();
        assert_eq!(c.element_type(), ElementType::Int16);
        assert_eq!(c.value(0, 0, 0).unwrap(), -5.0);
    }
}
