//! Vector geometries in WGS84 degrees.
//!
//! Geometries are parsed from WKT into `geo-types` and never mutated;
//! operations such as [`Geometry::buffer`] build new values.

pub mod buffer;
pub mod raster;

use geo::BoundingRect;
use geo_types::Rect;
use wkt::TryFromWkt;

use crate::error::GeometryError;

/// Geometry families as seen by the script API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    Collection,
}

impl GeometryKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::Collection => "GeometryCollection",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    shape: geo_types::Geometry<f64>,
}

impl Geometry {
    /// Parse well-known text, e.g. `POINT(120 30)`.
    pub fn from_wkt(text: &str) -> Result<Self, GeometryError> {
        let shape = geo_types::Geometry::<f64>::try_from_wkt_str(text.trim())
            .map_err(|e| GeometryError::Wkt(e.to_string()))?;
        Ok(Self { shape })
    }

    pub fn from_shape(shape: geo_types::Geometry<f64>) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &geo_types::Geometry<f64> {
        &self.shape
    }

    pub fn kind(&self) -> GeometryKind {
        use geo_types::Geometry as G;
        match &self.shape {
            G::Point(_) => GeometryKind::Point,
            G::Line(_) | G::LineString(_) => GeometryKind::LineString,
            G::Polygon(_) | G::Rect(_) | G::Triangle(_) => GeometryKind::Polygon,
            G::MultiPoint(_) => GeometryKind::MultiPoint,
            G::MultiLineString(_) => GeometryKind::MultiLineString,
            G::MultiPolygon(_) => GeometryKind::MultiPolygon,
            G::GeometryCollection(_) => GeometryKind::Collection,
        }
    }

    /// Polygon or MultiPolygon.
    pub fn is_area(&self) -> bool {
        matches!(self.kind(), GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }

    /// Fail with [`GeometryError::NotArea`] unless this is a (multi)polygon.
    pub fn require_area(&self) -> Result<(), GeometryError> {
        if self.is_area() {
            Ok(())
        } else {
            Err(GeometryError::NotArea(self.kind().name()))
        }
    }

    /// Bounding box in degrees; `None` for empty geometries.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.shape.bounding_rect()
    }

    /// Area within `radius` degrees of this geometry, approximating full
    /// circles with `segments` vertices. See [`buffer::buffer`].
    pub fn buffer(&self, radius: f64, segments: usize) -> Result<Geometry, GeometryError> {
        let area = buffer::buffer(&self.shape, radius, segments)?;
        Ok(Self {
            shape: geo_types::Geometry::MultiPolygon(area),
        })
    }
}
