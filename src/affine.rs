/// A 2D affine transform mapping tile pixel coordinates to WGS84 degrees.
///
/// Maps pixel coordinates (col, row) to (lon, lat):
///   lon = a * col + b * row + c
///   lat = d * col + e * row + f
///
/// Tiles are north-up, so `b` and `d` are zero and `e` is negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform with square pixels of `reso` degrees and the
    /// upper-left corner at (`west`, `north`).
    pub fn north_up(reso: f64, west: f64, north: f64) -> Self {
        Self::new(reso, 0.0, west, 0.0, -reso, north)
    }

    /// Apply the forward transform: (col, row) -> (lon, lat).
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.a * col + self.b * row + self.c;
        let y = self.d * col + self.e * row + self.f;
        (x, y)
    }
}
