//! Fixed-shape multi-band tile buffers.
//!
//! A [`TileBuffer`] is a tagged variant over the seven element types, each
//! holding a `(bands, 256, 256)` array in standard layout. Standard layout of
//! that shape is band-sequential: all of band 0 row by row from the top-left
//! pixel, then all of band 1, and so on.

pub mod codec;
pub mod convert;
pub mod element;

use ndarray::{concatenate, s, Array3, ArrayView3, Axis};

pub use element::{Element, ElementType};

use crate::error::TileError;
use crate::tile::TILE_SIZE;

/// Typed pixel storage, one variant per [`ElementType`].
#[derive(Clone, Debug, PartialEq)]
pub enum Pixels {
    Byte(Array3<u8>),
    UInt16(Array3<u16>),
    Int16(Array3<i16>),
    UInt32(Array3<u32>),
    Int32(Array3<i32>),
    Float32(Array3<f32>),
    Float64(Array3<f64>),
}

/// Run `$body` with `$arr` bound to the typed array inside `$pixels`.
macro_rules! dispatch {
    ($pixels:expr, $arr:ident => $body:expr) => {
        match $pixels {
            $crate::buffer::Pixels::Byte($arr) => $body,
            $crate::buffer::Pixels::UInt16($arr) => $body,
            $crate::buffer::Pixels::Int16($arr) => $body,
            $crate::buffer::Pixels::UInt32($arr) => $body,
            $crate::buffer::Pixels::Int32($arr) => $body,
            $crate::buffer::Pixels::Float32($arr) => $body,
            $crate::buffer::Pixels::Float64($arr) => $body,
        }
    };
}
pub(crate) use dispatch;

/// Run `$body` with the type alias `$t` bound to the Rust type of `$ty`.
macro_rules! with_element_type {
    ($ty:expr, $t:ident => $body:expr) => {
        match $ty {
            $crate::buffer::ElementType::Byte => {
                type $t = u8;
                $body
            }
            $crate::buffer::ElementType::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::buffer::ElementType::Int16 => {
                type $t = i16;
                $body
            }
            $crate::buffer::ElementType::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::buffer::ElementType::Int32 => {
                type $t = i32;
                $body
            }
            $crate::buffer::ElementType::Float32 => {
                type $t = f32;
                $body
            }
            $crate::buffer::ElementType::Float64 => {
                type $t = f64;
                $body
            }
        }
    };
}
pub(crate) use with_element_type;

fn type_of<T: Element>(_: &Array3<T>) -> ElementType {
    T::TYPE
}

impl Pixels {
    pub fn element_type(&self) -> ElementType {
        dispatch!(self, a => type_of(a))
    }

    /// `(bands, rows, cols)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        dispatch!(self, a => a.dim())
    }
}

/// One tile of pixel data: 256×256 pixels, one or more bands.
#[derive(Clone, Debug, PartialEq)]
pub struct TileBuffer {
    pixels: Pixels,
}

fn check_dimensions(width: usize, height: usize) -> Result<(), TileError> {
    if width != TILE_SIZE || height != TILE_SIZE {
        return Err(TileError::Dimensions { width, height });
    }
    Ok(())
}

impl TileBuffer {
    /// Allocate a new tile buffer.
    ///
    /// `width` and `height` must both be 256 and `band_count` positive. When
    /// `initial_value` is given every pixel of every band is set to it,
    /// saturated into `element_type`; otherwise pixels start at zero.
    pub fn create(
        element_type: ElementType,
        width: usize,
        height: usize,
        band_count: usize,
        initial_value: Option<f64>,
    ) -> Result<Self, TileError> {
        check_dimensions(width, height)?;
        if band_count == 0 {
            return Err(TileError::NoBands);
        }
        let init = initial_value.unwrap_or(0.0);
        let shape = (band_count, TILE_SIZE, TILE_SIZE);
        let pixels = with_element_type!(element_type, T => {
            T::wrap(Array3::from_elem(shape, T::from_f64(init)))
        });
        Ok(Self { pixels })
    }

    /// Wrap an existing `(bands, 256, 256)` array.
    pub fn from_array<T: Element>(array: Array3<T>) -> Result<Self, TileError> {
        let (bands, rows, cols) = array.dim();
        check_dimensions(cols, rows)?;
        if bands == 0 {
            return Err(TileError::NoBands);
        }
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Ok(Self {
            pixels: T::wrap(array),
        })
    }

    /// Wrap pixels produced by a kernel that already preserves the tile shape.
    pub(crate) fn from_pixels(pixels: Pixels) -> Self {
        debug_assert_eq!(pixels.dim().1, TILE_SIZE);
        debug_assert_eq!(pixels.dim().2, TILE_SIZE);
        Self { pixels }
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut Pixels {
        &mut self.pixels
    }

    pub fn element_type(&self) -> ElementType {
        self.pixels.element_type()
    }

    pub fn band_count(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().2
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().1
    }

    /// Size of the raw pixel payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.width() * self.height() * self.band_count() * self.element_type().size()
    }

    pub fn same_shape(&self, other: &TileBuffer) -> bool {
        self.pixels.dim() == other.pixels.dim()
    }

    fn check_index(&self, band: usize, row: usize, col: usize) -> Result<(), TileError> {
        if band >= self.band_count() {
            return Err(TileError::BandIndex {
                index: band,
                band_count: self.band_count(),
            });
        }
        if row >= self.height() || col >= self.width() {
            return Err(TileError::InvalidArgument(format!(
                "pixel ({row}, {col}) outside the tile"
            )));
        }
        Ok(())
    }

    /// Read one pixel value widened to `f64`.
    pub fn value(&self, band: usize, row: usize, col: usize) -> Result<f64, TileError> {
        self.check_index(band, row, col)?;
        Ok(dispatch!(&self.pixels, a => a[(band, row, col)].to_f64()))
    }

    /// Write one pixel value, saturated into the buffer's element type.
    pub fn set_value(
        &mut self,
        band: usize,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), TileError> {
        self.check_index(band, row, col)?;
        dispatch!(&mut self.pixels, a => a[(band, row, col)] = Element::from_f64(value));
        Ok(())
    }

    /// All pixels widened to `f64`, same `(bands, rows, cols)` shape.
    pub fn to_f64_array(&self) -> Array3<f64> {
        dispatch!(&self.pixels, a => a.mapv(|v| v.to_f64()))
    }

    /// Copy band `band_index` (0-based) into a new single-band buffer.
    pub fn extract(&self, band_index: usize) -> Result<TileBuffer, TileError> {
        if band_index >= self.band_count() {
            return Err(TileError::BandIndex {
                index: band_index,
                band_count: self.band_count(),
            });
        }
        Ok(Self::from_pixels(dispatch!(&self.pixels, a => {
            Element::wrap(a.slice(s![band_index..=band_index, .., ..]).to_owned())
        })))
    }

    /// Concatenate the bands of `buffers`, in order, into one buffer.
    ///
    /// The result takes the element type of the first buffer; bands from
    /// buffers of other types are converted with saturation.
    pub fn stack(buffers: &[&TileBuffer]) -> Result<TileBuffer, TileError> {
        let first = buffers
            .first()
            .ok_or_else(|| TileError::InvalidArgument("no buffers to stack".into()))?;
        for buf in buffers {
            if buf.width() != first.width() || buf.height() != first.height() {
                return Err(TileError::Shape(format!(
                    "cannot stack {}x{} with {}x{}",
                    buf.width(),
                    buf.height(),
                    first.width(),
                    first.height()
                )));
            }
        }
        let pixels = with_element_type!(first.element_type(), T => {
            let arrays: Vec<Array3<T>> = buffers.iter().map(|b| b.to_array::<T>()).collect();
            let views: Vec<ArrayView3<'_, T>> = arrays.iter().map(|a| a.view()).collect();
            let stacked = concatenate(Axis(0), &views)
                .map_err(|e| TileError::Shape(e.to_string()))?;
            T::wrap(stacked)
        });
        Ok(Self::from_pixels(pixels))
    }
}
