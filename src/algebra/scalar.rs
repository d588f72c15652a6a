//! In-place arithmetic with a constant.

use ndarray::Array3;

use super::ArithOp;
use crate::buffer::{dispatch, Element, TileBuffer};
use crate::error::TileError;

fn const_kernel<T: Element>(array: &mut Array3<T>, op: ArithOp, number: f64, fill: f64) {
    array.par_mapv_inplace(|v| {
        let current = v.to_f64();
        if current == fill {
            v
        } else {
            T::from_f64(op.apply_f64(current, number))
        }
    });
}

impl TileBuffer {
    /// Apply `pixel = pixel op number` to every band in place.
    ///
    /// Pixels whose current value equals `fill` are left untouched. The
    /// arithmetic runs in `f64` and the result saturates into this buffer's
    /// own element type.
    ///
    /// # Errors
    /// [`TileError::InvalidArgument`] when dividing by zero; the buffer is
    /// not modified in that case.
    pub fn apply_const(&mut self, op: ArithOp, number: f64, fill: f64) -> Result<(), TileError> {
        if op == ArithOp::Div && number == 0.0 {
            return Err(TileError::InvalidArgument("division by constant zero".into()));
        }
        if number.is_nan() {
            return Err(TileError::InvalidArgument("constant is NaN".into()));
        }
        dispatch!(self.pixels_mut(), a => const_kernel(a, op, number, fill));
        Ok(())
    }

    pub fn add_const(&mut self, number: f64, fill: f64) -> Result<(), TileError> {
        self.apply_const(ArithOp::Add, number, fill)
    }

    pub fn sub_const(&mut self, number: f64, fill: f64) -> Result<(), TileError> {
        self.apply_const(ArithOp::Sub, number, fill)
    }

    pub fn mul_const(&mut self, number: f64, fill: f64) -> Result<(), TileError> {
        self.apply_const(ArithOp::Mul, number, fill)
    }

    pub fn div_const(&mut self, number: f64, fill: f64) -> Result<(), TileError> {
        self.apply_const(ArithOp::Div, number, fill)
    }
}
