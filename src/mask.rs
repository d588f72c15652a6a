//! Binary masks and the geometry-driven operations built on them.
//!
//! A mask is a single-band `Byte` tile holding 1 for selected pixels and 0
//! elsewhere.

use ndarray::{Array2, Array3, Axis, Zip};

use crate::algebra::ValidRange;
use crate::buffer::{dispatch, Element, ElementType, TileBuffer};
use crate::error::{EngineError, TileError};
use crate::geometry::raster::{classify_area, touched_cells};
use crate::geometry::Geometry;
use crate::tile::Tile;

/// Set every pixel of every band whose cell in `selected` equals `when`.
fn write_where<T: Element>(array: &mut Array3<T>, selected: &Array2<bool>, when: bool, value: f64) {
    let value = T::from_f64(value);
    for band in array.axis_iter_mut(Axis(0)) {
        Zip::from(band).and(selected).par_for_each(|v, &s| {
            if s == when {
                *v = value;
            }
        });
    }
}

/// Overwrite the pixels of `array` selected by `grid` with those of `source`.
fn copy_where<T: Element>(array: &mut Array3<T>, source: &Array3<T>, grid: &Array2<bool>) {
    for (band, src) in array.axis_iter_mut(Axis(0)).zip(source.axis_iter(Axis(0))) {
        Zip::from(band).and(src).and(grid).par_for_each(|v, &s, &inside| {
            if inside {
                *v = s;
            }
        });
    }
}

impl TileBuffer {
    /// Single-band `Byte` mask from a selection grid.
    pub fn mask_from_grid(grid: &Array2<bool>) -> TileBuffer {
        let (rows, cols) = grid.dim();
        let values = Array3::from_shape_fn((1, rows, cols), |(_, r, c)| u8::from(grid[(r, c)]));
        TileBuffer::from_pixels(u8::wrap(values))
    }

    pub fn is_mask(&self) -> bool {
        self.element_type() == ElementType::Byte && self.band_count() == 1
    }

    /// Selection grid of a mask: `true` where the mask holds 1.
    fn mask_grid(&self) -> Result<Array2<bool>, TileError> {
        if self.element_type() != ElementType::Byte {
            return Err(TileError::TypeMismatch {
                expected: ElementType::Byte,
                found: self.element_type(),
            });
        }
        if self.band_count() != 1 {
            return Err(TileError::Shape(format!(
                "mask must have 1 band, found {}",
                self.band_count()
            )));
        }
        let values = self.to_array::<u8>();
        Ok(values.index_axis(Axis(0), 0).mapv(|v| v == 1))
    }

    /// Mask of the pixels equal to `target`.
    pub fn build_mask(&self, target: f64) -> Result<TileBuffer, TileError> {
        self.build_mask_range(target, target)
    }

    /// Mask of the pixels in `[min, max]`, inclusive.
    ///
    /// # Errors
    /// [`TileError::Shape`] unless this buffer has exactly one band.
    pub fn build_mask_range(&self, min: f64, max: f64) -> Result<TileBuffer, TileError> {
        if self.band_count() != 1 {
            return Err(TileError::Shape(format!(
                "masks are built from 1-band tiles, found {} bands",
                self.band_count()
            )));
        }
        let range = ValidRange::new(min, max);
        let values = self.to_f64_array();
        let grid = values.index_axis(Axis(0), 0).mapv(|v| range.contains(v));
        Ok(TileBuffer::mask_from_grid(&grid))
    }

    /// Keep pixels where `mask` is 1 and set every other pixel, in every
    /// band, to `fill`. Mutates this buffer.
    ///
    /// # Errors
    /// [`TileError::TypeMismatch`] / [`TileError::Shape`] unless `mask` is a
    /// single-band `Byte` tile of the same size.
    pub fn apply_mask(&mut self, mask: &TileBuffer, fill: f64) -> Result<(), TileError> {
        if mask.width() != self.width() || mask.height() != self.height() {
            return Err(TileError::Shape("mask size differs from tile".into()));
        }
        let keep = mask.mask_grid()?;
        dispatch!(self.pixels_mut(), a => write_where(a, &keep, false, fill));
        Ok(())
    }

    /// Copy with every pixel whose center lies outside `geometry` set to
    /// `fill`. A tile entirely outside comes back filled, not as an error.
    ///
    /// # Errors
    /// [`crate::error::GeometryError::NotArea`] for non-polygonal geometries.
    pub fn clip_by_geometry(
        &self,
        geometry: &Geometry,
        tile: &Tile,
        fill: f64,
    ) -> Result<TileBuffer, EngineError> {
        let inside = classify_area(geometry, tile)?;
        let mut out = self.clone();
        dispatch!(out.pixels_mut(), a => write_where(a, &inside, false, fill));
        Ok(out)
    }

    /// Copy with the cells touched by `geometry` set to `burn_value` in every
    /// band. This buffer is left unchanged.
    pub fn burn(&self, geometry: &Geometry, tile: &Tile, burn_value: f64) -> TileBuffer {
        let touched = touched_cells(geometry, tile);
        let mut out = self.clone();
        dispatch!(out.pixels_mut(), a => write_where(a, &touched, true, burn_value));
        out
    }
}

/// Pixels inside `geometry` from `inside`, all others from `outside`.
///
/// # Errors
/// Non-polygonal geometries, and inputs that differ in shape or element type.
pub fn merge_by_geometry(
    geometry: &Geometry,
    tile: &Tile,
    inside: &TileBuffer,
    outside: &TileBuffer,
) -> Result<TileBuffer, EngineError> {
    if !inside.same_shape(outside) {
        return Err(TileError::Shape(format!(
            "inside has {} band(s), outside has {}",
            inside.band_count(),
            outside.band_count()
        ))
        .into());
    }
    if inside.element_type() != outside.element_type() {
        return Err(TileError::TypeMismatch {
            expected: outside.element_type(),
            found: inside.element_type(),
        }
        .into());
    }
    let grid = classify_area(geometry, tile)?;
    let mut out = outside.clone();
    dispatch!(out.pixels_mut(), a => copy_where(a, &inside.to_array(), &grid));
    Ok(out)
}
