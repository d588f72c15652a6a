use thiserror::Error;

use crate::buffer::ElementType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TileError {
    #[error("Invalid dimensions: {width}x{height} (tiles are fixed at 256x256)")]
    Dimensions { width: usize, height: usize },

    #[error("Band count must be greater than zero")]
    NoBands,

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Element type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    #[error("Band index {index} out of range for {band_count} band(s)")]
    BandIndex { index: usize, band_count: usize },

    #[error("Unknown element type code: {0}")]
    UnknownTypeCode(i64),

    #[error("Unknown composite method code: {0}")]
    UnknownMethodCode(i64),

    #[error("Pixel function returned {found} value(s) at pixel {pixel}, expected {expected}")]
    Arity {
        pixel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("Latitude {0} outside [-90, 90]")]
    Latitude(f64),

    #[error("Longitude {0} outside [-180, 180]")]
    Longitude(f64),

    #[error("Zoom level {0} not supported")]
    Zoom(u8),

    #[error("Pixel ({row}, {col}) outside the tile")]
    Pixel { row: usize, col: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid WKT: {0}")]
    Wkt(String),

    #[error("{0} geometry does not enclose an area")]
    NotArea(&'static str),

    #[error("Invalid buffer radius {0} for a non-area geometry")]
    Radius(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Dataset {name} not available at {datetime}")]
    Dataset { name: String, datetime: u64 },

    #[error("Geometry {0} not found")]
    Geometry(String),

    #[error("Region of interest {0} not found")]
    Region(String),

    #[error("Datetime query failed: {0}")]
    Datetime(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Tile(#[from] TileError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Entry function panicked: {0}")]
    Panic(String),
}
