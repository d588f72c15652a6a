//! Serialized tile layout used at host boundaries.
//!
//! Four little-endian `u32` header fields (element type code, width, height,
//! band count) followed by the band-sequential pixel payload, little-endian,
//! exactly `width * height * bands * size_of(type)` bytes long.

use ndarray::Array3;

use super::{dispatch, with_element_type, Element, ElementType, TileBuffer};
use crate::error::TileError;
use crate::tile::TILE_SIZE;

/// Length of the header in bytes.
pub const HEADER_LEN: usize = 16;

fn read_u32(bytes: &[u8], field: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[field * 4..field * 4 + 4]);
    u32::from_le_bytes(raw)
}

fn decode_payload<T: Element>(payload: &[u8], bands: usize) -> Result<Array3<T>, TileError> {
    let size = T::TYPE.size();
    let values: Vec<T> = payload.chunks_exact(size).map(T::read_le).collect();
    Array3::from_shape_vec((bands, TILE_SIZE, TILE_SIZE), values)
        .map_err(|e| TileError::Decode(e.to_string()))
}

impl TileBuffer {
    /// Serialize header and pixels.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.byte_len());
        for field in [
            u32::from(self.element_type().code()),
            self.width() as u32,
            self.height() as u32,
            self.band_count() as u32,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        // Standard layout iteration order is band-sequential
        dispatch!(self.pixels(), a => a.iter().for_each(|v| v.write_le(&mut out)));
        out
    }

    /// Parse bytes produced by [`TileBuffer::encode`].
    pub fn decode(bytes: &[u8]) -> Result<TileBuffer, TileError> {
        if bytes.len() < HEADER_LEN {
            return Err(TileError::Decode(format!(
                "{} bytes is shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }
        let ty = ElementType::from_code(i64::from(read_u32(bytes, 0)))?;
        let width = read_u32(bytes, 1) as usize;
        let height = read_u32(bytes, 2) as usize;
        let bands = read_u32(bytes, 3) as usize;
        if width != TILE_SIZE || height != TILE_SIZE {
            return Err(TileError::Dimensions { width, height });
        }
        if bands == 0 {
            return Err(TileError::NoBands);
        }

        let payload = &bytes[HEADER_LEN..];
        let expected = width * height * bands * ty.size();
        if payload.len() != expected {
            return Err(TileError::Decode(format!(
                "payload is {} bytes, expected {expected}",
                payload.len()
            )));
        }

        let pixels = with_element_type!(ty, T => T::wrap(decode_payload::<T>(payload, bands)?));
        Ok(TileBuffer::from_pixels(pixels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let buf = TileBuffer::create(ElementType::Int16, 256, 256, 2, Some(-2.0)).unwrap();
        let bytes = buf.encode();
        assert_eq!(bytes.len(), HEADER_LEN + 256 * 256 * 2 * 2);
        assert_eq!(&bytes[0..4], &[3, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[0, 1, 0, 0]);
        assert_eq!(&bytes[12..16], &[2, 0, 0, 0]);
        assert_eq!(&bytes[16..18], &(-2_i16).to_le_bytes());
    }

    #[test]
    fn test_band_sequential_payload() {
        let mut buf = TileBuffer::create(ElementType::Byte, 256, 256, 2, None).unwrap();
        buf.set_value(0, 0, 1, 11.0).unwrap();
        buf.set_value(1, 1, 0, 22.0).unwrap();
        let bytes = buf.encode();
        assert_eq!(bytes[HEADER_LEN + 1], 11);
        assert_eq!(bytes[HEADER_LEN + 256 * 256 + 256], 22);
    }

    #[test]
    fn test_decode_restores_buffer() {
        let mut buf = TileBuffer::create(ElementType::Float64, 256, 256, 1, Some(0.25)).unwrap();
        buf.set_value(0, 200, 17, -1e10).unwrap();
        assert_eq!(TileBuffer::decode(&buf.encode()).unwrap(), buf);
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let buf = TileBuffer::create(ElementType::UInt32, 256, 256, 1, None).unwrap();
        let bytes = buf.encode();
        assert!(matches!(
            TileBuffer::decode(&bytes[..bytes.len() - 1]),
            Err(TileError::Decode(_))
        ));
        assert!(TileBuffer::decode(&bytes[..4]).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let mut bytes = TileBuffer::create(ElementType::Byte, 256, 256, 1, None)
            .unwrap()
            .encode();
        bytes[0] = 9;
        assert_eq!(TileBuffer::decode(&bytes), Err(TileError::UnknownTypeCode(9)));
    }
}
