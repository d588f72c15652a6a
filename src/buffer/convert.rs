//! Element type conversion of whole tiles.

use ndarray::Array3;

use super::{dispatch, with_element_type, Element, ElementType, TileBuffer};

fn cast<S: Element, T: Element>(src: &Array3<S>) -> Array3<T> {
    src.mapv(|v| T::from_f64(v.to_f64()))
}

impl TileBuffer {
    /// Copy of every pixel converted (with saturation) into `T`.
    pub(crate) fn to_array<T: Element>(&self) -> Array3<T> {
        dispatch!(self.pixels(), a => cast::<_, T>(a))
    }

    /// Copy of this tile in `element_type`.
    ///
    /// Values that fit are preserved; anything else clamps to the target range,
    /// and floats going to an integer type are truncated toward zero.
    pub fn convert(&self, element_type: ElementType) -> TileBuffer {
        if element_type == self.element_type() {
            return self.clone();
        }
        let pixels = with_element_type!(element_type, T => T::wrap(self.to_array::<T>()));
        TileBuffer::from_pixels(pixels)
    }

    pub fn to_byte(&self) -> TileBuffer {
        self.convert(ElementType::Byte)
    }

    pub fn to_uint16(&self) -> TileBuffer {
        self.convert(ElementType::UInt16)
    }

    pub fn to_int16(&self) -> TileBuffer {
        self.convert(ElementType::Int16)
    }

    pub fn to_uint32(&self) -> TileBuffer {
        self.convert(ElementType::UInt32)
    }

    pub fn to_int32(&self) -> TileBuffer {
        self.convert(ElementType::Int32)
    }

    pub fn to_float32(&self) -> TileBuffer {
        self.convert(ElementType::Float32)
    }

    pub fn to_float64(&self) -> TileBuffer {
        self.convert(ElementType::Float64)
    }
}
