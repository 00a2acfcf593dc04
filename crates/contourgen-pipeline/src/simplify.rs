//! Line simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces vertex count by dropping vertices that lie within a given
//! tolerance of the chord between the retained vertices on either side.
//! The subdivision runs over an explicit stack of index ranges, so very
//! long contours cannot exhaust the call stack.
//!
//! Applied to each sub-line produced by [`split`](crate::split), or to
//! the whole contour when it has no hydrography crossings.

use crate::types::{Point, Polyline};

/// Simplify a single polyline using the Ramer-Douglas-Peucker algorithm.
///
/// Vertices within `tolerance` of the chord between their retained
/// neighbours are removed. The first and last vertices are always kept
/// exactly. A tolerance of 0.0 keeps every vertex that deviates at all.
///
/// Polylines with fewer than 3 points, and any negative or NaN
/// tolerance, return the input unchanged.
#[must_use = "returns the simplified polyline"]
pub fn simplify(polyline: &Polyline, tolerance: f64) -> Polyline {
    let points = polyline.points();
    if points.len() < 3 || tolerance.is_nan() || tolerance < 0.0 {
        return polyline.clone();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_idx != start && max_dist > tolerance {
            kept[max_idx] = true;
            stack.push((max_idx, end));
            stack.push((start, max_idx));
        }
    }

    let simplified: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Polyline::new(simplified)
}

/// Simplify each sub-line independently.
#[must_use = "returns the simplified sub-lines"]
pub fn simplify_parts(parts: &[Polyline], tolerance: f64) -> Vec<Polyline> {
    parts.iter().map(|pl| simplify(pl, tolerance)).collect()
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide (a closed ring's chord), returns the
/// distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn two_points_unchanged() {
        let pl = line(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(simplify(&pl, 1.0), pl);
    }

    #[test]
    fn shallow_bump_collapses_to_chord() {
        let pl = line(&[(0.0, 0.0), (5.0, 0.1), (10.0, 0.0)]);
        let result = simplify(&pl, 1.0);
        assert_eq!(result, line(&[(0.0, 0.0), (10.0, 0.0)]));
    }

    #[test]
    fn zero_tolerance_preserves_deviating_points() {
        let pl = line(&[(0.0, 0.0), (1.0, 0.1), (2.0, 0.0), (3.0, 0.05), (4.0, 0.0)]);
        assert_eq!(simplify(&pl, 0.0).len(), 5);
    }

    #[test]
    fn zigzag_retains_peaks() {
        let pl = line(&[(0.0, 0.0), (2.0, 5.0), (4.0, 0.0), (6.0, 5.0), (8.0, 0.0)]);
        assert_eq!(simplify(&pl, 1.0).len(), 5);
    }

    #[test]
    fn large_tolerance_collapses_zigzag() {
        let pl = line(&[(0.0, 0.0), (2.0, 5.0), (4.0, 0.0), (6.0, 5.0), (8.0, 0.0)]);
        assert_eq!(simplify(&pl, 10.0).len(), 2);
    }

    #[test]
    fn keeps_only_significant_vertex() {
        let pl = line(&[(0.0, 0.0), (1.0, 0.1), (2.0, 3.0), (3.0, 0.1), (4.0, 0.0)]);
        let result = simplify(&pl, 1.0);
        assert_eq!(result, line(&[(0.0, 0.0), (2.0, 3.0), (4.0, 0.0)]));
    }

    #[test]
    fn closed_ring_keeps_farthest_vertex() {
        let ring = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let result = simplify(&ring, 1.0);
        assert!(result.points().contains(&Point::new(10.0, 10.0)));
        assert_eq!(result.first(), ring.first());
        assert_eq!(result.last(), ring.last());
    }

    #[test]
    fn long_line_does_not_recurse() {
        // Alternating spikes force a subdivision at nearly every vertex.
        #[allow(clippy::cast_precision_loss)]
        let points: Vec<Point> = (0..20_000)
            .map(|i| Point::new(i as f64, if i % 2 == 0 { 0.0 } else { 1.0 + i as f64 * 1e-6 }))
            .collect();
        let pl = Polyline::new(points);
        let result = simplify(&pl, 0.1);
        assert_eq!(result.first(), pl.first());
        assert_eq!(result.last(), pl.last());
    }

    #[test]
    fn negative_tolerance_returns_input() {
        let pl = line(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        assert_eq!(simplify(&pl, -1.0), pl);
        assert_eq!(simplify(&pl, f64::NAN), pl);
    }

    #[test]
    fn simplify_parts_applies_to_each() {
        let parts = vec![
            line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]),
            line(&[(0.0, 0.0), (1.0, 5.0), (2.0, 0.0)]),
        ];
        let results = simplify_parts(&parts, 0.5);
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[1].len(), 3);
    }

    #[test]
    fn perpendicular_distance_diagonal_segment() {
        let d = perpendicular_distance(
            Point::new(2.0, -1.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 2.0),
        );
        let expected = 8.0 / 20.0_f64.sqrt();
        assert!((d - expected).abs() < 1e-10, "got {d}, expected {expected}");
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints() {
        let d = perpendicular_distance(
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-10);
    }
}
