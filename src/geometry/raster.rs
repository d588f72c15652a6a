//! Rasterization of geometries onto a tile's 256×256 cell grid.
//!
//! Areas select the cells whose center they contain (boundary included).
//! Points and lines select every cell whose footprint they touch. Footprints
//! are half-open, `[west, east) × (south, north]`, so a point on a shared
//! edge or corner belongs to exactly one cell: the one east and south of it,
//! matching [`TileAddress::locate`](crate::tile::TileAddress::locate).

use geo::{BoundingRect, Intersects};
use geo_types::{coord, Coord, Geometry as Shape, Line, LineString, Polygon, Rect};
use ndarray::{Array2, Zip};

use super::Geometry;
use crate::error::GeometryError;
use crate::tile::{Tile, TILE_SIZE};

/// Primitive piece of a geometry with its own selection rule.
#[derive(Clone, Debug)]
enum Part {
    Area(Polygon<f64>),
    Segment(Line<f64>),
    Vertex(Coord<f64>),
}

#[derive(Clone, Debug)]
struct Prepared {
    part: Part,
    bbox: Rect<f64>,
}

impl Prepared {
    fn new(part: Part) -> Option<Self> {
        let bbox = match &part {
            Part::Area(p) => p.bounding_rect()?,
            Part::Segment(l) => l.bounding_rect(),
            Part::Vertex(c) => Rect::new(*c, *c),
        };
        Some(Self { part, bbox })
    }

    fn selects(&self, center: Coord<f64>, cell: &Rect<f64>) -> bool {
        if !self.bbox.intersects(cell) {
            return false;
        }
        match &self.part {
            Part::Area(p) => p.intersects(&center),
            Part::Segment(l) => segment_touches(l, cell),
            Part::Vertex(c) => {
                let (min, max) = (cell.min(), cell.max());
                c.x >= min.x && c.x < max.x && c.y > min.y && c.y <= max.y
            }
        }
    }
}

/// Whether `line` meets the half-open footprint of `cell`.
///
/// The part of `line` inside the closed rectangle is found by Liang-Barsky
/// clipping. It misses the half-open footprint only when it lies entirely on
/// the east edge or entirely on the south edge.
fn segment_touches(line: &Line<f64>, cell: &Rect<f64>) -> bool {
    let (min, max) = (cell.min(), cell.max());
    let delta = line.delta();
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-delta.x, line.start.x - min.x),
        (delta.x, max.x - line.start.x),
        (-delta.y, line.start.y - min.y),
        (delta.y, max.y - line.start.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    if t0 > t1 {
        return false;
    }
    let at = |t: f64| coord! { x: line.start.x + t * delta.x, y: line.start.y + t * delta.y };
    let (a, b) = (at(t0), at(t1));
    let on_east = a.x >= max.x && b.x >= max.x;
    let on_south = a.y <= min.y && b.y <= min.y;
    !on_east && !on_south
}

fn decompose(shape: &Shape<f64>, out: &mut Vec<Part>) {
    match shape {
        Shape::Point(p) => out.push(Part::Vertex(p.0)),
        Shape::MultiPoint(mp) => out.extend(mp.iter().map(|p| Part::Vertex(p.0))),
        Shape::Line(l) => out.push(Part::Segment(*l)),
        Shape::LineString(ls) => decompose_line(ls, out),
        Shape::MultiLineString(mls) => mls.iter().for_each(|ls| decompose_line(ls, out)),
        Shape::Polygon(p) => out.push(Part::Area(p.clone())),
        Shape::MultiPolygon(mp) => out.extend(mp.iter().cloned().map(Part::Area)),
        Shape::Rect(r) => out.push(Part::Area(r.to_polygon())),
        Shape::Triangle(t) => out.push(Part::Area(t.to_polygon())),
        Shape::GeometryCollection(gc) => gc.iter().for_each(|g| decompose(g, out)),
    }
}

fn decompose_line(ls: &LineString<f64>, out: &mut Vec<Part>) {
    if let [only] = ls.0.as_slice() {
        out.push(Part::Vertex(*only));
    }
    out.extend(ls.lines().map(Part::Segment));
}

/// Cells of `tile` selected by `geometry`, `true` = selected.
fn rasterize(geometry: &Geometry, tile: &Tile) -> Array2<bool> {
    let mut grid = Array2::from_elem((TILE_SIZE, TILE_SIZE), false);

    let tile_bounds = tile.bounds();
    let mut parts = Vec::new();
    decompose(geometry.shape(), &mut parts);
    let parts: Vec<Prepared> = parts
        .into_iter()
        .filter_map(Prepared::new)
        .filter(|p| p.bbox.intersects(&tile_bounds))
        .collect();
    if parts.is_empty() {
        return grid;
    }

    let gt = tile.geotransform();
    Zip::indexed(&mut grid).par_for_each(|(row, col), selected| {
        let (west, north) = gt.forward(col as f64, row as f64);
        let (east, south) = gt.forward(col as f64 + 1.0, row as f64 + 1.0);
        let cell = Rect::new(coord! { x: west, y: south }, coord! { x: east, y: north });
        let center = cell.center();
        *selected = parts.iter().any(|p| p.selects(center, &cell));
    });
    grid
}

/// Inside/outside classification of each cell by pixel-center containment.
///
/// # Errors
/// [`GeometryError::NotArea`] unless `geometry` is a Polygon or MultiPolygon.
pub fn classify_area(geometry: &Geometry, tile: &Tile) -> Result<Array2<bool>, GeometryError> {
    geometry.require_area()?;
    Ok(rasterize(geometry, tile))
}

/// Cells touched by `geometry` of any kind: polygons select the cells whose
/// center they contain, points and lines the cells whose footprint they hit.
pub fn touched_cells(geometry: &Geometry, tile: &Tile) -> Array2<bool> {
    rasterize(geometry, tile)
}
