//! Tile addressing on the global WGS84 grid.
//!
//! At zoom `z` a pixel spans `reso = 360 / 2^z / 256` degrees. Tile columns
//! count eastward from -180° and tile rows count southward from +90°, so the
//! grid has `2^z` tiles around the globe and `2^(z-1)` from pole to pole.

use geo_types::{coord, Rect};

use crate::affine::Affine;
use crate::error::AddressError;

/// Width and height of every tile, in pixels.
pub const TILE_SIZE: usize = 256;

/// Number of pixels in one band of a tile.
pub const TILE_PIXELS: usize = TILE_SIZE * TILE_SIZE;

/// Deepest zoom level accepted; beyond this the tile indices overflow `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Degrees per pixel at zoom `z`.
pub fn resolution(z: u8) -> f64 {
    360.0 / 2f64.powi(i32::from(z)) / TILE_SIZE as f64
}

/// A tile of the global grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl Tile {
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, AddressError> {
        if z > MAX_ZOOM {
            return Err(AddressError::Zoom(z));
        }
        Ok(Self { z, x, y })
    }

    pub fn resolution(&self) -> f64 {
        resolution(self.z)
    }

    /// Pixel (col, row) → (lon, lat) transform for this tile.
    pub fn geotransform(&self) -> Affine {
        let span = self.resolution() * TILE_SIZE as f64;
        Affine::north_up(
            self.resolution(),
            f64::from(self.x) * span - 180.0,
            90.0 - f64::from(self.y) * span,
        )
    }

    /// Footprint of the whole tile in degrees.
    pub fn bounds(&self) -> Rect<f64> {
        let gt = self.geotransform();
        let (west, north) = gt.forward(0.0, 0.0);
        let (east, south) = gt.forward(TILE_SIZE as f64, TILE_SIZE as f64);
        Rect::new(coord! { x: west, y: south }, coord! { x: east, y: north })
    }

    /// Footprint of the cell at (`row`, `col`).
    pub fn cell_bounds(&self, row: usize, col: usize) -> Result<Rect<f64>, AddressError> {
        check_pixel(row, col)?;
        let gt = self.geotransform();
        let (west, north) = gt.forward(col as f64, row as f64);
        let (east, south) = gt.forward(col as f64 + 1.0, row as f64 + 1.0);
        Ok(Rect::new(
            coord! { x: west, y: south },
            coord! { x: east, y: north },
        ))
    }

    /// Center of the cell at (`row`, `col`) as (lon, lat).
    pub fn pixel_center(&self, row: usize, col: usize) -> Result<(f64, f64), AddressError> {
        check_pixel(row, col)?;
        Ok(self.geotransform().forward(col as f64 + 0.5, row as f64 + 0.5))
    }
}

fn check_pixel(row: usize, col: usize) -> Result<(), AddressError> {
    if row >= TILE_SIZE || col >= TILE_SIZE {
        return Err(AddressError::Pixel { row, col });
    }
    Ok(())
}

/// Location of a geographic coordinate: the tile plus the row/col inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileAddress {
    pub tile: Tile,
    pub row: usize,
    pub col: usize,
}

impl TileAddress {
    /// Locate (`lon`, `lat`) at zoom `z`.
    ///
    /// Longitudes are not wrapped; callers normalize to [-180, 180] first.
    /// A coordinate exactly on a tile edge belongs to the tile east/south of it.
    pub fn locate(z: u8, lon: f64, lat: f64) -> Result<Self, AddressError> {
        if z > MAX_ZOOM {
            return Err(AddressError::Zoom(z));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AddressError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(AddressError::Longitude(lon));
        }

        let reso = resolution(z);
        let size = TILE_SIZE as f64;
        let px = (lon + 180.0) / reso;
        let py = (lat - 90.0) / -reso;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = ((px / size).floor() as u32, (py / size).floor() as u32);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (col, row) = (
            (px.rem_euclid(size) as usize).min(TILE_SIZE - 1),
            (py.rem_euclid(size) as usize).min(TILE_SIZE - 1),
        );

        Ok(Self {
            tile: Tile { z, x, y },
            row,
            col,
        })
    }

    /// Center of the addressed cell as (lon, lat).
    pub fn lon_lat(&self) -> (f64, f64) {
        self.tile
            .geotransform()
            .forward(self.col as f64 + 0.5, self.row as f64 + 0.5)
    }
}
