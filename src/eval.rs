//! Per-pixel evaluation of user functions.
//!
//! A [`PixelFunction`] receives the values of one pixel across all bands plus
//! the pixel's row-major index (`row * 256 + col`) and returns one value or a
//! fixed number of values. The first pixel fixes the output band count.
//!
//! Pixels are evaluated in parallel, so functions must be pure: evaluation
//! order is unspecified. Each pixel is evaluated exactly once.

use ndarray::Array3;
use rayon::prelude::*;

use crate::buffer::{with_element_type, Element, ElementType, TileBuffer};
use crate::error::TileError;

/// Result of evaluating a pixel function at one pixel.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelValue {
    Scalar(f64),
    Bands(Vec<f64>),
}

impl PixelValue {
    /// Number of output bands this value fills.
    pub fn arity(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Bands(values) => values.len(),
        }
    }

    fn write(&self, out: &mut [f64]) {
        match self {
            Self::Scalar(v) => out[0] = *v,
            Self::Bands(values) => out.copy_from_slice(values),
        }
    }
}

impl From<f64> for PixelValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for PixelValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Bands(values)
    }
}

impl<const N: usize> From<[f64; N]> for PixelValue {
    fn from(values: [f64; N]) -> Self {
        Self::Bands(values.to_vec())
    }
}

/// Strategy applied to every pixel by [`TileBuffer::for_each_pixel`].
pub trait PixelFunction: Sync {
    fn evaluate(&self, bands: &[f64], index: usize) -> PixelValue;
}

impl<F, R> PixelFunction for F
where
    F: Fn(&[f64], usize) -> R + Sync,
    R: Into<PixelValue>,
{
    fn evaluate(&self, bands: &[f64], index: usize) -> PixelValue {
        self(bands, index).into()
    }
}

impl TileBuffer {
    /// Build a new buffer of `out_type` from `f` evaluated at every pixel.
    ///
    /// # Errors
    /// [`TileError::Arity`] when a pixel returns a different number of values
    /// than pixel 0, [`TileError::InvalidArgument`] when pixel 0 returns none.
    pub fn for_each_pixel<F>(&self, f: &F, out_type: ElementType) -> Result<TileBuffer, TileError>
    where
        F: PixelFunction + ?Sized,
    {
        let bands = self.band_count();
        let (rows, cols) = (self.height(), self.width());

        // Pixel-interleaved copy so each pixel's bands are one contiguous slice
        let source = self.to_f64_array();
        let interleaved = source.view().permuted_axes([1, 2, 0]);
        let interleaved = interleaved.as_standard_layout();
        let input = interleaved
            .as_slice()
            .ok_or_else(|| TileError::Shape("pixel values are not contiguous".into()))?;

        let first = f.evaluate(&input[..bands], 0);
        let arity = first.arity();
        if arity == 0 {
            return Err(TileError::InvalidArgument(
                "pixel function returned no values".into(),
            ));
        }

        let mut output = vec![0.0; rows * cols * arity];
        let (head, rest) = output.split_at_mut(arity);
        first.write(head);
        rest.par_chunks_mut(arity)
            .zip(input[bands..].par_chunks(bands))
            .enumerate()
            .try_for_each(|(offset, (out, values))| {
                let index = offset + 1;
                let value = f.evaluate(values, index);
                if value.arity() != arity {
                    return Err(TileError::Arity {
                        pixel: index,
                        expected: arity,
                        found: value.arity(),
                    });
                }
                value.write(out);
                Ok(())
            })?;

        let result = Array3::from_shape_vec((rows, cols, arity), output)
            .map_err(|e| TileError::Shape(e.to_string()))?
            .permuted_axes([2, 0, 1]);
        with_element_type!(out_type, T => {
            TileBuffer::from_array(result.mapv(<T as Element>::from_f64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::tile::TILE_SIZE;

    fn two_band() -> TileBuffer {
        let mut buf = TileBuffer::create(ElementType::UInt16, 256, 256, 2, Some(10.0)).unwrap();
        for col in 0..TILE_SIZE {
            buf.set_value(1, 3, col, 30.0).unwrap();
        }
        buf
    }

    #[test]
    fn test_scalar_output_is_single_band() {
        let out = two_band()
            .for_each_pixel(
                &|b: &[f64], _: usize| (b[1] - b[0]) / (b[1] + b[0]),
                ElementType::Float64,
            )
            .unwrap();
        assert_eq!(out.band_count(), 1);
        assert_eq!(out.element_type(), ElementType::Float64);
        assert_relative_eq!(out.value(0, 3, 7).unwrap(), 0.5);
        assert_relative_eq!(out.value(0, 4, 7).unwrap(), 0.0);
    }

    #[test]
    fn test_band_values_in_order() {
        let out = two_band()
            .for_each_pixel(&|b: &[f64], _: usize| [b[1], b[0], b[0] + b[1]], ElementType::Int32)
            .unwrap();
        assert_eq!(out.band_count(), 3);
        assert_eq!(out.value(0, 3, 0).unwrap(), 30.0);
        assert_eq!(out.value(1, 3, 0).unwrap(), 10.0);
        assert_eq!(out.value(2, 3, 0).unwrap(), 40.0);
    }

    #[test]
    fn test_index_is_row_major() {
        let buf = TileBuffer::create(ElementType::Byte, 256, 256, 1, None).unwrap();
        let out = buf
            .for_each_pixel(&|_: &[f64], i: usize| i as f64, ElementType::Float64)
            .unwrap();
        assert_eq!(out.value(0, 0, 1).unwrap(), 1.0);
        assert_eq!(out.value(0, 1, 0).unwrap(), 256.0);
        assert_eq!(out.value(0, 255, 255).unwrap(), 65535.0);
    }

    #[test]
    fn test_output_saturates() {
        let buf = TileBuffer::create(ElementType::Byte, 256, 256, 1, Some(200.0)).unwrap();
        let out = buf
            .for_each_pixel(&|b: &[f64], _: usize| b[0] * 2.0, ElementType::Byte)
            .unwrap();
        assert_eq!(out.value(0, 9, 9).unwrap(), 255.0);
    }

    #[test]
    fn test_arity_mismatch() {
        let buf = TileBuffer::create(ElementType::Byte, 256, 256, 1, None).unwrap();
        let uneven = |_: &[f64], i: usize| {
            if i == 1000 {
                vec![1.0]
            } else {
                vec![1.0, 2.0]
            }
        };
        assert_eq!(
            buf.for_each_pixel(&uneven, ElementType::Float32),
            Err(TileError::Arity {
                pixel: 1000,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_empty_output_rejected() {
        let buf = TileBuffer::create(ElementType::Byte, 256, 256, 1, None).unwrap();
        let nothing = |_: &[f64], _: usize| Vec::<f64>::new();
        assert!(matches!(
            buf.for_each_pixel(&nothing, ElementType::Byte),
            Err(TileError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_each_pixel_evaluated_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls: Vec<AtomicUsize> = (0..TILE_SIZE * TILE_SIZE)
            .map(|_| AtomicUsize::new(0))
            .collect();
        let counting = |_: &[f64], i: usize| {
            calls[i].fetch_add(1, Ordering::Relaxed);
            i as f64
        };
        let buf = TileBuffer::create(ElementType::Byte, 256, 256, 1, None).unwrap();
        let out = buf.for_each_pixel(&counting, ElementType::Float64).unwrap();
        assert!(calls.iter().all(|c| c.load(Ordering::Relaxed) == 1));
        assert_eq!(out.value(0, 0, 0).unwrap(), 0.0);
        assert_eq!(out.value(0, 0, 1).unwrap(), 1.0);
    }

    struct Threshold(f64);

    impl PixelFunction for Threshold {
        fn evaluate(&self, bands: &[f64], _: usize) -> PixelValue {
            PixelValue::Scalar(if bands[0] >= self.0 { 1.0 } else { 0.0 })
        }
    }

    #[test]
    fn test_strategy_object() {
        let out = two_band().for_each_pixel(&Threshold(10.0), ElementType::Byte).unwrap();
        assert!(out.is_mask());
        assert_eq!(out.value(0, 0, 0).unwrap(), 1.0);
    }
}
