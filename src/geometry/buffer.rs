//! Fixed-radius buffering of geometries.
//!
//! The buffer of a point is a disc, of a segment a capsule (the segment swept
//! by a disc), and of a polygon the polygon itself plus the capsules of all
//! its ring edges. The union of those pieces is the exact buffer up to the
//! polygonal approximation of circular arcs. Pieces are dissolved into one
//! `MultiPolygon` whose parts do not overlap.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geo::BooleanOps;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::error::GeometryError;

/// Lower bound on the vertex count of an approximated circle.
pub const MIN_SEGMENTS: usize = 8;

/// Buffer `shape` by `radius` degrees.
///
/// Non-positive radii leave polygons unchanged; points and lines have no
/// area to keep, so they fail with [`GeometryError::Radius`].
pub fn buffer(
    shape: &Geometry<f64>,
    radius: f64,
    segments: usize,
) -> Result<MultiPolygon<f64>, GeometryError> {
    if radius.is_nan() {
        return Err(GeometryError::Radius(radius));
    }
    let segments = segments.max(MIN_SEGMENTS);
    let mut parts = Vec::new();
    collect(shape, radius, segments, &mut parts)?;
    Ok(dissolve(parts))
}

/// Union of `parts`, merged one piece at a time.
fn dissolve(parts: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return MultiPolygon::new(vec![]);
    };
    parts.fold(MultiPolygon::new(vec![first]), |merged, part| {
        merged.union(&MultiPolygon::new(vec![part]))
    })
}

fn collect(
    shape: &Geometry<f64>,
    radius: f64,
    segments: usize,
    out: &mut Vec<Polygon<f64>>,
) -> Result<(), GeometryError> {
    let grow = radius > 0.0;
    match shape {
        Geometry::Point(p) if grow => out.push(disc(p.0, radius, segments)),
        Geometry::MultiPoint(mp) if grow => {
            out.extend(mp.iter().map(|p| disc(p.0, radius, segments)));
        }
        Geometry::Line(l) if grow => out.push(capsule(l.start, l.end, radius, segments)),
        Geometry::LineString(ls) if grow => sweep(ls, radius, segments, out),
        Geometry::MultiLineString(mls) if grow => {
            mls.iter().for_each(|ls| sweep(ls, radius, segments, out));
        }
        Geometry::Polygon(poly) => grow_polygon(poly, radius, segments, out),
        Geometry::MultiPolygon(mp) => {
            mp.iter().for_each(|poly| grow_polygon(poly, radius, segments, out));
        }
        Geometry::Rect(r) => grow_polygon(&r.to_polygon(), radius, segments, out),
        Geometry::Triangle(t) => grow_polygon(&t.to_polygon(), radius, segments, out),
        Geometry::GeometryCollection(gc) => {
            for member in gc.iter() {
                collect(member, radius, segments, out)?;
            }
        }
        Geometry::Point(_)
        | Geometry::MultiPoint(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiLineString(_) => return Err(GeometryError::Radius(radius)),
    }
    Ok(())
}

fn grow_polygon(poly: &Polygon<f64>, radius: f64, segments: usize, out: &mut Vec<Polygon<f64>>) {
    out.push(poly.clone());
    if radius > 0.0 {
        sweep(poly.exterior(), radius, segments, out);
        for ring in poly.interiors() {
            sweep(ring, radius, segments, out);
        }
    }
}

/// Capsules for every segment of `ls`; a single vertex becomes a disc.
fn sweep(ls: &LineString<f64>, radius: f64, segments: usize, out: &mut Vec<Polygon<f64>>) {
    match ls.0.as_slice() {
        [] => {}
        [only] => out.push(disc(*only, radius, segments)),
        coords => out.extend(
            coords
                .windows(2)
                .map(|w| capsule(w[0], w[1], radius, segments)),
        ),
    }
}

fn arc(center: Coord<f64>, radius: f64, from: f64, steps: usize, out: &mut Vec<Coord<f64>>) {
    for i in 0..=steps {
        let angle = from + PI * i as f64 / steps as f64;
        out.push(Coord {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        });
    }
}

/// Regular `segments`-gon around `center`, counter-clockwise.
pub fn disc(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let angle = TAU * i as f64 / segments as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Segment `start`-`end` swept by a disc of `radius`, counter-clockwise.
pub fn capsule(start: Coord<f64>, end: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    if start == end {
        return disc(start, radius, segments);
    }
    let heading = (end.y - start.y).atan2(end.x - start.x);
    let steps = segments / 2;
    let mut ring = Vec::with_capacity(2 * steps + 2);
    arc(end, radius, heading - FRAC_PI_2, steps, &mut ring);
    arc(start, radius, heading + FRAC_PI_2, steps, &mut ring);
    Polygon::new(LineString::from(ring), vec![])
}
