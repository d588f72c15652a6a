//! In-place value remapping.

use ndarray::Array3;

use super::ValidRange;
use crate::buffer::{dispatch, Element, TileBuffer};

fn remap_where<T: Element>(array: &mut Array3<T>, range: ValidRange, new_value: f64) {
    let replacement = T::from_f64(new_value);
    array.par_mapv_inplace(|v| if range.contains(v.to_f64()) { replacement } else { v });
}

impl TileBuffer {
    /// Replace every pixel equal to `old_value` with `new_value` (saturated).
    pub fn remap(&mut self, old_value: f64, new_value: f64) {
        self.remap_range(old_value, old_value, new_value);
    }

    /// Replace every pixel in `[min, max]` with `new_value` (saturated).
    pub fn remap_range(&mut self, min: f64, max: f64, new_value: f64) {
        let range = ValidRange::new(min, max);
        dispatch!(self.pixels_mut(), a => remap_where(a, range, new_value));
    }
}
