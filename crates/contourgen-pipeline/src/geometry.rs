//! Geometry primitives: point-to-segment and point-to-polyline distance,
//! coincidence tests, and locating a point along a line.
//!
//! Closest-point computations go through `geo`; pipeline [`Point`]s are
//! converted at this module boundary.

use geo::{Closest, ClosestPoint, Line};

use crate::types::{Point, Polyline};

/// Convert a pipeline `Point` to a `geo::Coord`.
pub(crate) const fn point_to_coord(p: Point) -> geo::Coord<f64> {
    geo::Coord { x: p.x, y: p.y }
}

/// Convert a `geo::Coord` back to a pipeline `Point`.
pub(crate) const fn coord_to_point(c: geo::Coord<f64>) -> Point {
    Point::new(c.x, c.y)
}

/// Build the `geo::Line` for the segment `a -> b`.
pub(crate) fn segment_line(a: Point, b: Point) -> Line<f64> {
    Line::new(point_to_coord(a), point_to_coord(b))
}

/// Closest point on the segment `a -> b` to `p`.
///
/// A zero-length segment yields `a`.
#[must_use]
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let line = segment_line(a, b);
    match line.closest_point(&geo::Point::from(point_to_coord(p))) {
        Closest::Intersection(c) | Closest::SinglePoint(c) => coord_to_point(c.into()),
        Closest::Indeterminate => a,
    }
}

/// Euclidean distance from `p` to the segment `a -> b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Minimum distance from `p` to any segment of `line`.
///
/// A single-vertex line degrades to point distance; an empty line is
/// infinitely far away.
#[must_use]
pub fn distance_to_polyline(p: Point, line: &Polyline) -> f64 {
    match line.points() {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        points => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Whether `p` lies on `line` within `tolerance`.
#[must_use]
pub fn is_coincident(p: Point, line: &Polyline, tolerance: f64) -> bool {
    distance_to_polyline(p, line) < tolerance
}

/// Where a point falls along a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLocation {
    /// Index of the segment from vertex `segment` to `segment + 1`.
    pub segment: usize,
    /// Closest point on that segment.
    pub projected: Point,
    /// Distance from the query point to `projected`.
    pub distance: f64,
}

/// Find the segment of `line` nearest to `p`.
///
/// The first segment in traversal order wins ties, so a point sitting on
/// a shared vertex is located on the segment that ends there. Returns
/// `None` for lines with fewer than 2 vertices.
#[must_use]
pub fn locate(p: Point, line: &Polyline) -> Option<LineLocation> {
    let mut best: Option<LineLocation> = None;
    for (segment, w) in line.points().windows(2).enumerate() {
        let projected = closest_point_on_segment(p, w[0], w[1]);
        let distance = p.distance(projected);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(LineLocation {
                segment,
                projected,
                distance,
            });
        }
    }
    best
}

/// Distance travelled along `line` from its first vertex to `location`.
#[must_use]
pub fn arc_position(line: &Polyline, location: &LineLocation) -> f64 {
    let points = line.points();
    let before: f64 = points[..=location.segment]
        .windows(2)
        .map(|w| w[0].distance(w[1]))
        .sum();
    before + points[location.segment].distance(location.projected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn l_shape() -> Polyline {
        Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ])
    }

    #[test]
    fn segment_distance_perpendicular() {
        let d = distance_to_segment(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn segment_distance_beyond_endpoint_uses_endpoint() {
        let d = distance_to_segment(
            Point::new(-80.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((d - 80.0).abs() < 1e-12);
    }

    #[test]
    fn zero_length_segment_is_point_distance() {
        let d = distance_to_segment(
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn polyline_distance_takes_minimum_segment() {
        let d = distance_to_polyline(Point::new(12.0, 5.0), &l_shape());
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_polyline_is_infinitely_far() {
        let d = distance_to_polyline(Point::new(0.0, 0.0), &Polyline::new(vec![]));
        assert!(d.is_infinite());
    }

    #[test]
    fn coincidence_uses_strict_tolerance() {
        let line = l_shape();
        assert!(is_coincident(Point::new(5.0, 1e-7), &line, 1e-6));
        assert!(!is_coincident(Point::new(5.0, 1e-3), &line, 1e-6));
    }

    #[test]
    fn locate_shared_vertex_prefers_earlier_segment() {
        let loc = locate(Point::new(10.0, 0.0), &l_shape()).unwrap();
        assert_eq!(loc.segment, 0);
        assert!(loc.distance < 1e-12);
    }

    #[test]
    fn locate_on_second_segment() {
        let loc = locate(Point::new(11.0, 4.0), &l_shape()).unwrap();
        assert_eq!(loc.segment, 1);
        assert!((loc.projected.y - 4.0).abs() < 1e-12);
        assert!((loc.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn locate_needs_a_segment() {
        assert!(locate(Point::new(0.0, 0.0), &Polyline::new(vec![Point::new(1.0, 1.0)])).is_none());
    }

    #[test]
    fn arc_position_accumulates_previous_segments() {
        let line = l_shape();
        let loc = locate(Point::new(10.0, 4.0), &line).unwrap();
        assert!((arc_position(&line, &loc) - 14.0).abs() < 1e-12);
    }
}
