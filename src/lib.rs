//! Tile-based raster computation over a global WGS84 grid.
//!
//! Scripts run once per 256×256 tile. They receive multi-band
//! [`TileBuffer`]s, combine them with pixel algebra, compositing, masks and
//! geometries, and return one buffer or nothing. [`engine::PixelEngine`] is
//! the script-facing entry point; the modules below it are plain library code
//! returning `Result`.

pub mod affine;
pub mod algebra;
pub mod buffer;
pub mod composite;
pub mod engine;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod mask;
pub mod tile;

pub use algebra::{ArithOp, ValidRange};
pub use buffer::{ElementType, TileBuffer};
pub use composite::{composite, CompositeMethod, CompositeParams};
pub use engine::{EngineOptions, HostServices, PixelEngine};
pub use error::{AddressError, EngineError, GeometryError, HostError, TileError};
pub use eval::{PixelFunction, PixelValue};
pub use geometry::Geometry;
pub use tile::{Tile, TileAddress, TILE_SIZE};
